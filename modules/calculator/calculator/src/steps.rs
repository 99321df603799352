//! Step vocabulary for calculator scenarios.
//!
//! One dispatch table from (step kind, anchored regex) to handler, shared by
//! every scenario runner so a feature file means the same thing everywhere.
//! The table is built once and shared read-only; all per-scenario state lives
//! in [`ScenarioContext`].

use std::fmt;
use std::sync::Arc;

use calculator_sdk::{
    CalculatorClientV1, CalculatorError, Operation, OperationRequest, OperationResult,
    ParseOperationError,
};
use regex::{Captures, Regex};
use thiserror::Error;

/// Number literal accepted in step text: optional sign, optional fraction,
/// optional exponent (`-3`, `+1.5`, `2e1`).
pub const NUMBER: &str = r"[-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?";

/// Result cell of an evaluation table that expects the division error.
pub const DIVISION_BY_ZERO_CELL: &str = "division by zero";

/// Gherkin step kind. `And`/`But` steps inherit the kind of the step before them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Given,
    When,
    Then,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
        })
    }
}

/// Why a single step failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepFailure {
    #[error("undefined step: {kind} {text}")]
    Undefined { kind: StepKind, text: String },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error(transparent)]
    UnknownOperation(#[from] ParseOperationError),

    #[error("no operation was performed before the assertion")]
    MissingOutcome,

    #[error("{request}: expected {expected}, got {actual}")]
    Mismatch {
        request: String,
        expected: f64,
        actual: f64,
    },

    #[error("{request}: expected {expected}, but the calculator reported: {error}")]
    UnexpectedError {
        request: String,
        expected: String,
        error: CalculatorError,
    },

    #[error("{request}: expected a {expected} error, got {actual}")]
    MissingError {
        request: String,
        expected: CalculatorError,
        actual: f64,
    },

    #[error("step does not accept a data table")]
    UnexpectedTable,

    #[error("step does not accept a doc string")]
    UnexpectedDocString,

    #[error("step requires a data table")]
    MissingTable,

    #[error("invalid data table: {0}")]
    InvalidTable(String),

    #[error("row {row}: {source}")]
    Row {
        row: usize,
        source: Box<StepFailure>,
    },
}

/// A step as handed to [`StepRegistry::dispatch`]: its text plus any
/// attached data table or doc string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepInput<'a> {
    pub text: &'a str,
    pub table: Option<&'a [Vec<String>]>,
    pub docstring: Option<&'a str>,
}

impl<'a> StepInput<'a> {
    #[must_use]
    pub const fn new(text: &'a str) -> Self {
        Self {
            text,
            table: None,
            docstring: None,
        }
    }

    #[must_use]
    pub const fn with_table(mut self, rows: &'a [Vec<String>]) -> Self {
        self.table = Some(rows);
        self
    }

    #[must_use]
    pub const fn with_docstring(mut self, docstring: &'a str) -> Self {
        self.docstring = Some(docstring);
        self
    }
}

/// Scenario-scoped state handed to every step handler.
///
/// A fresh context is created for each scenario, so nothing leaks between them.
pub struct ScenarioContext {
    client: Arc<dyn CalculatorClientV1>,
    tolerance: f64,
    last: Option<(OperationRequest, OperationResult)>,
}

impl ScenarioContext {
    #[must_use]
    pub fn new(client: Arc<dyn CalculatorClientV1>, tolerance: f64) -> Self {
        Self {
            client,
            tolerance,
            last: None,
        }
    }

    /// The most recent request and its result, if any operation ran.
    #[must_use]
    pub const fn last(&self) -> Option<&(OperationRequest, OperationResult)> {
        self.last.as_ref()
    }

    fn perform(&mut self, request: OperationRequest) {
        let result = self.client.evaluate(&request);
        tracing::debug!(%request, ?result, "step invoked calculator");
        self.last = Some((request, result));
    }

    fn expect_last(&self) -> Result<(OperationRequest, OperationResult), StepFailure> {
        self.last.ok_or(StepFailure::MissingOutcome)
    }

    fn assert_result(&self, expected: f64) -> Result<(), StepFailure> {
        let (request, result) = self.expect_last()?;
        match result {
            Ok(actual) if (actual - expected).abs() <= self.tolerance => Ok(()),
            Ok(actual) => Err(StepFailure::Mismatch {
                request: request.to_string(),
                expected,
                actual,
            }),
            Err(error) => Err(StepFailure::UnexpectedError {
                request: request.to_string(),
                expected: expected.to_string(),
                error,
            }),
        }
    }

    fn assert_division_by_zero(&self) -> Result<(), StepFailure> {
        let (request, result) = self.expect_last()?;
        match result {
            Err(CalculatorError::DivisionByZero) => Ok(()),
            Ok(actual) => Err(StepFailure::MissingError {
                request: request.to_string(),
                expected: CalculatorError::DivisionByZero,
                actual,
            }),
        }
    }
}

impl fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("tolerance", &self.tolerance)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

/// What a handler sees of a matched step.
pub struct StepMatch<'a> {
    captures: Captures<'a>,
    table: Option<&'a [Vec<String>]>,
}

impl StepMatch<'_> {
    fn capture(&self, idx: usize) -> &str {
        self.captures.get(idx).map_or("", |m| m.as_str())
    }

    fn number(&self, idx: usize) -> Result<f64, StepFailure> {
        let raw = self.capture(idx);
        raw.parse()
            .map_err(|_| StepFailure::InvalidNumber(raw.to_owned()))
    }
}

type StepHandler = fn(&mut ScenarioContext, &StepMatch<'_>) -> Result<(), StepFailure>;

/// One entry of the dispatch table.
pub struct StepBinding {
    kind: StepKind,
    pattern: Regex,
    takes_table: bool,
    handler: StepHandler,
}

impl StepBinding {
    /// A binding for a plain step; an attached table is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn new(kind: StepKind, pattern: &str, handler: StepHandler) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            pattern: Regex::new(pattern)?,
            takes_table: false,
            handler,
        })
    }

    /// A binding whose step must carry a data table.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn with_table(
        kind: StepKind,
        pattern: &str,
        handler: StepHandler,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            takes_table: true,
            ..Self::new(kind, pattern, handler)?
        })
    }

    #[must_use]
    pub const fn kind(&self) -> StepKind {
        self.kind
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    #[must_use]
    pub const fn takes_table(&self) -> bool {
        self.takes_table
    }
}

impl fmt::Debug for StepBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepBinding")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern.as_str())
            .field("takes_table", &self.takes_table)
            .finish_non_exhaustive()
    }
}

/// Lookup table from (kind, pattern) to handler.
#[derive(Debug, Default)]
pub struct StepRegistry {
    bindings: Vec<StepBinding>,
}

impl StepRegistry {
    /// The calculator step vocabulary.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn calculator() -> Result<Self, regex::Error> {
        let mut registry = Self::default();
        registry.register(StepBinding::new(
            StepKind::Given,
            r"^the calculator is running$",
            calculator_is_running,
        )?);
        registry.register(StepBinding::new(
            StepKind::When,
            &format!(r"^I (add|subtract|multiply|divide) ({NUMBER}) and ({NUMBER})$"),
            perform_operation,
        )?);
        registry.register(StepBinding::with_table(
            StepKind::When,
            r"^I evaluate the following:?$",
            evaluate_table,
        )?);
        registry.register(StepBinding::new(
            StepKind::Then,
            &format!(r"^the result should be ({NUMBER})$"),
            result_should_be,
        )?);
        registry.register(StepBinding::new(
            StepKind::Then,
            r"^the calculator should report a division by zero error$",
            division_by_zero_reported,
        )?);
        Ok(registry)
    }

    pub fn register(&mut self, binding: StepBinding) {
        self.bindings.push(binding);
    }

    #[must_use]
    pub fn bindings(&self) -> &[StepBinding] {
        &self.bindings
    }

    /// Run the first binding of `kind` whose pattern matches the step text.
    ///
    /// # Errors
    ///
    /// Returns `StepFailure::Undefined` if nothing matches, a table or doc
    /// string error if the step's attachments do not fit the binding, otherwise
    /// whatever the handler reports.
    pub fn dispatch(
        &self,
        ctx: &mut ScenarioContext,
        kind: StepKind,
        input: &StepInput<'_>,
    ) -> Result<(), StepFailure> {
        let text = input.text.trim();
        let Some((binding, captures)) = self
            .bindings
            .iter()
            .filter(|b| b.kind == kind)
            .find_map(|b| b.pattern.captures(text).map(|caps| (b, caps)))
        else {
            return Err(StepFailure::Undefined {
                kind,
                text: text.to_owned(),
            });
        };

        if input.docstring.is_some() {
            return Err(StepFailure::UnexpectedDocString);
        }
        match (binding.takes_table, input.table) {
            (true, None) => return Err(StepFailure::MissingTable),
            (false, Some(_)) => return Err(StepFailure::UnexpectedTable),
            _ => {}
        }

        let matched = StepMatch {
            captures,
            table: input.table,
        };
        (binding.handler)(ctx, &matched)
    }
}

/// Parse one table cell as a finite number.
fn number_cell(raw: &str) -> Result<f64, StepFailure> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| StepFailure::InvalidNumber(raw.to_owned()))
}

#[allow(clippy::unnecessary_wraps)]
fn calculator_is_running(_ctx: &mut ScenarioContext, _m: &StepMatch<'_>) -> Result<(), StepFailure> {
    Ok(())
}

fn perform_operation(ctx: &mut ScenarioContext, m: &StepMatch<'_>) -> Result<(), StepFailure> {
    let operation: Operation = m.capture(1).parse()?;
    let request = OperationRequest::new(operation, m.number(2)?, m.number(3)?);
    ctx.perform(request);
    Ok(())
}

/// `operation | a | b | result` rows, each performed and checked in order.
fn evaluate_table(ctx: &mut ScenarioContext, m: &StepMatch<'_>) -> Result<(), StepFailure> {
    let rows = m.table.ok_or(StepFailure::MissingTable)?;
    let Some((header, body)) = rows.split_first() else {
        return Err(StepFailure::InvalidTable("table is empty".to_owned()));
    };
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| StepFailure::InvalidTable(format!("missing column '{name}'")))
    };
    let columns = [column("operation")?, column("a")?, column("b")?, column("result")?];
    if body.is_empty() {
        return Err(StepFailure::InvalidTable("no rows below the header".to_owned()));
    }

    for (idx, row) in body.iter().enumerate() {
        let [operation, a, b, expected] = columns.map(|col| row.get(col).map_or("", |c| c.trim()));
        evaluate_row(ctx, operation, a, b, expected).map_err(|source| StepFailure::Row {
            row: idx + 1,
            source: Box::new(source),
        })?;
    }
    Ok(())
}

fn evaluate_row(
    ctx: &mut ScenarioContext,
    operation: &str,
    a: &str,
    b: &str,
    expected: &str,
) -> Result<(), StepFailure> {
    let request = OperationRequest::new(operation.parse()?, number_cell(a)?, number_cell(b)?);
    ctx.perform(request);
    if expected.eq_ignore_ascii_case(DIVISION_BY_ZERO_CELL) {
        ctx.assert_division_by_zero()
    } else {
        ctx.assert_result(number_cell(expected)?)
    }
}

fn result_should_be(ctx: &mut ScenarioContext, m: &StepMatch<'_>) -> Result<(), StepFailure> {
    ctx.assert_result(m.number(1)?)
}

fn division_by_zero_reported(
    ctx: &mut ScenarioContext,
    _m: &StepMatch<'_>,
) -> Result<(), StepFailure> {
    ctx.assert_division_by_zero()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn setup() -> (StepRegistry, ScenarioContext) {
        let registry = StepRegistry::calculator().unwrap();
        let ctx = ScenarioContext::new(crate::client(), 1.0e-9);
        (registry, ctx)
    }

    fn run(
        registry: &StepRegistry,
        ctx: &mut ScenarioContext,
        kind: StepKind,
        text: &str,
    ) -> Result<(), StepFailure> {
        registry.dispatch(ctx, kind, &StepInput::new(text))
    }

    fn table(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| (*c).to_owned()).collect())
            .collect()
    }

    #[test]
    fn test_registry_has_one_binding_per_phrase() {
        let registry = StepRegistry::calculator().unwrap();
        let kinds: Vec<StepKind> = registry.bindings().iter().map(StepBinding::kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Given,
                StepKind::When,
                StepKind::When,
                StepKind::Then,
                StepKind::Then
            ]
        );
        assert!(registry.bindings().iter().all(|b| b.pattern().starts_with('^')));
        assert_eq!(
            registry.bindings().iter().filter(|b| b.takes_table()).count(),
            1
        );
    }

    #[test]
    fn test_given_is_noop() {
        let (registry, mut ctx) = setup();
        run(&registry, &mut ctx, StepKind::Given, "the calculator is running").unwrap();
        assert!(ctx.last().is_none());
    }

    #[test]
    fn test_when_stores_result() {
        let (registry, mut ctx) = setup();
        run(&registry, &mut ctx, StepKind::When, "I add 4 and 5").unwrap();
        let (request, result) = ctx.last().unwrap();
        assert_eq!(request.operation(), Operation::Add);
        assert_eq!(*result, Ok(9.0));
    }

    #[test]
    fn test_number_grammar_accepts_sign_fraction_and_exponent() {
        let (registry, mut ctx) = setup();
        run(&registry, &mut ctx, StepKind::When, "I multiply +1.5 and 2e1").unwrap();
        assert_eq!(ctx.last().unwrap().1, Ok(30.0));
        run(&registry, &mut ctx, StepKind::When, "I subtract -1.5 and 2E-1").unwrap();
        assert_eq!(ctx.last().unwrap().1, Ok(-1.7));
    }

    #[test]
    fn test_then_uses_tolerance() {
        let (registry, mut ctx) = setup();
        run(&registry, &mut ctx, StepKind::When, "I add 0.1 and 0.2").unwrap();
        run(&registry, &mut ctx, StepKind::Then, "the result should be 0.3").unwrap();
    }

    #[test]
    fn test_then_reports_mismatch() {
        let (registry, mut ctx) = setup();
        run(&registry, &mut ctx, StepKind::When, "I add 4 and 5").unwrap();
        let err = run(&registry, &mut ctx, StepKind::Then, "the result should be 10").unwrap_err();
        assert_eq!(
            err,
            StepFailure::Mismatch {
                request: "4 + 5".to_owned(),
                expected: 10.0,
                actual: 9.0,
            }
        );
        assert_eq!(err.to_string(), "4 + 5: expected 10, got 9");
    }

    #[test]
    fn test_then_reports_unexpected_division_by_zero() {
        let (registry, mut ctx) = setup();
        run(&registry, &mut ctx, StepKind::When, "I divide 7 and 0").unwrap();
        let err = run(&registry, &mut ctx, StepKind::Then, "the result should be 0").unwrap_err();
        assert!(matches!(
            err,
            StepFailure::UnexpectedError {
                error: CalculatorError::DivisionByZero,
                ..
            }
        ));
    }

    #[test]
    fn test_division_by_zero_step() {
        let (registry, mut ctx) = setup();
        let phrase = "the calculator should report a division by zero error";
        run(&registry, &mut ctx, StepKind::When, "I divide 7 and 0").unwrap();
        run(&registry, &mut ctx, StepKind::Then, phrase).unwrap();

        run(&registry, &mut ctx, StepKind::When, "I divide 7 and 1").unwrap();
        let err = run(&registry, &mut ctx, StepKind::Then, phrase).unwrap_err();
        assert!(matches!(err, StepFailure::MissingError { actual, .. } if actual == 7.0));
    }

    #[test]
    fn test_assertion_without_operation() {
        let (registry, mut ctx) = setup();
        let err = run(&registry, &mut ctx, StepKind::Then, "the result should be 9").unwrap_err();
        assert_eq!(err, StepFailure::MissingOutcome);
    }

    #[test]
    fn test_undefined_step() {
        let (registry, mut ctx) = setup();
        let err = run(&registry, &mut ctx, StepKind::When, "I modulo 4 and 5").unwrap_err();
        assert_eq!(err.to_string(), "undefined step: When I modulo 4 and 5");
    }

    #[test]
    fn test_kind_must_match() {
        let (registry, mut ctx) = setup();
        let err = run(&registry, &mut ctx, StepKind::Then, "I add 4 and 5").unwrap_err();
        assert!(matches!(err, StepFailure::Undefined { kind: StepKind::Then, .. }));
    }

    #[test]
    fn test_evaluation_table_checks_every_row() {
        let (registry, mut ctx) = setup();
        let rows = table(&[
            &["operation", "a", "b", "result"],
            &["add", "4", "5", "9"],
            &["divide", "1", "4", "0.25"],
            &["divide", "7", "0", "division by zero"],
        ]);
        let input = StepInput::new("I evaluate the following:").with_table(&rows);
        registry.dispatch(&mut ctx, StepKind::When, &input).unwrap();
        assert_eq!(ctx.last().unwrap().1, Err(CalculatorError::DivisionByZero));
    }

    #[test]
    fn test_evaluation_table_names_the_failing_row() {
        let (registry, mut ctx) = setup();
        let rows = table(&[
            &["a", "b", "operation", "result"],
            &["6", "7", "multiply", "42"],
            &["4", "5", "add", "10"],
        ]);
        let input = StepInput::new("I evaluate the following:").with_table(&rows);
        let err = registry.dispatch(&mut ctx, StepKind::When, &input).unwrap_err();
        assert_eq!(err.to_string(), "row 2: 4 + 5: expected 10, got 9");
    }

    #[test]
    fn test_evaluation_table_requires_its_columns() {
        let (registry, mut ctx) = setup();
        let rows = table(&[&["operation", "a", "b"], &["add", "1", "2"]]);
        let input = StepInput::new("I evaluate the following:").with_table(&rows);
        let err = registry.dispatch(&mut ctx, StepKind::When, &input).unwrap_err();
        assert_eq!(err, StepFailure::InvalidTable("missing column 'result'".to_owned()));
    }

    #[test]
    fn test_table_step_without_table_fails() {
        let (registry, mut ctx) = setup();
        let err = run(&registry, &mut ctx, StepKind::When, "I evaluate the following:").unwrap_err();
        assert_eq!(err, StepFailure::MissingTable);
    }

    #[test]
    fn test_unexpected_attachments_fail_the_step() {
        let (registry, mut ctx) = setup();
        let rows = table(&[&["a"], &["1"]]);
        let with_table = StepInput::new("I add 4 and 5").with_table(&rows);
        assert_eq!(
            registry.dispatch(&mut ctx, StepKind::When, &with_table),
            Err(StepFailure::UnexpectedTable)
        );
        assert!(ctx.last().is_none());

        let with_doc = StepInput::new("I add 4 and 5").with_docstring("notes");
        assert_eq!(
            registry.dispatch(&mut ctx, StepKind::When, &with_doc),
            Err(StepFailure::UnexpectedDocString)
        );
    }
}
