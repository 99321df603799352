//! Turns Gherkin feature files into flat, executable scenario plans.

use std::path::{Path, PathBuf};

use calculator::steps::{StepInput, StepKind};
use gherkin::{Background, Examples, Feature, GherkinEnv, Scenario, Step, StepType};
use regex::{Captures, Regex};

use crate::error::ScenarioError;

/// `<name>` reference to an Examples column.
const PLACEHOLDER: &str = r"<([^>\s]+)>";

fn step_kind(ty: StepType) -> StepKind {
    match ty {
        StepType::Given => StepKind::Given,
        StepType::When => StepKind::When,
        StepType::Then => StepKind::Then,
    }
}

/// One step, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub kind: StepKind,
    /// Keyword as written (`Given`, `And`, ...), without trailing space.
    pub keyword: String,
    pub text: String,
    pub line: usize,
    /// Data table rows, header first.
    pub table: Option<Vec<Vec<String>>>,
    pub docstring: Option<String>,
}

impl PlannedStep {
    fn from_gherkin(step: &Step) -> Self {
        Self {
            kind: step_kind(step.ty),
            keyword: step.keyword.trim().to_owned(),
            text: step.value.trim().to_owned(),
            line: step.position.line,
            table: step.table.as_ref().map(|t| t.rows.clone()),
            docstring: step.docstring.clone(),
        }
    }

    /// The step as it reads in the feature file.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!("{} {}", self.keyword, self.text)
    }

    /// Borrowed view handed to the step registry.
    #[must_use]
    pub fn input(&self) -> StepInput<'_> {
        let mut input = StepInput::new(&self.text);
        if let Some(rows) = &self.table {
            input = input.with_table(rows);
        }
        if let Some(docstring) = &self.docstring {
            input = input.with_docstring(docstring);
        }
        input
    }
}

/// A scenario with its background steps already prepended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioPlan {
    pub path: PathBuf,
    pub feature: String,
    pub name: String,
    pub line: usize,
    pub steps: Vec<PlannedStep>,
    /// Set when the scenario cannot be run as written.
    pub invalid: Option<String>,
}

/// Read and parse one feature file.
///
/// # Errors
///
/// Returns `ScenarioError::Read` if the file cannot be read, or
/// `ScenarioError::Parse` if it is not valid Gherkin.
pub fn load_feature(path: &Path) -> Result<Vec<ScenarioPlan>, ScenarioError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_feature(&text, path)
}

/// Parse feature text into scenario plans.
///
/// Feature background steps come first, then rule background steps, then the
/// scenario's own steps. A Scenario Outline becomes one plan per Examples row,
/// named `<outline name> #<n>` with `<column>` references filled in from that
/// row. A reference to a missing column marks the row's plan invalid.
///
/// # Errors
///
/// Returns `ScenarioError::Parse` if the text is not valid Gherkin.
pub fn parse_feature(text: &str, path: &Path) -> Result<Vec<ScenarioPlan>, ScenarioError> {
    let feature =
        Feature::parse(text, GherkinEnv::default()).map_err(|e| ScenarioError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let planner = Planner {
        path,
        feature: &feature,
        placeholder: Regex::new(PLACEHOLDER)?,
    };

    let feature_background = background_steps(feature.background.as_ref());
    let mut plans = Vec::new();

    for scenario in &feature.scenarios {
        planner.plan(scenario, &feature_background, &mut plans);
    }

    for rule in &feature.rules {
        let mut background = feature_background.clone();
        background.extend(background_steps(rule.background.as_ref()));
        for scenario in &rule.scenarios {
            planner.plan(scenario, &background, &mut plans);
        }
    }

    plans.sort_by_key(|p| p.line);
    tracing::debug!(path = %path.display(), scenarios = plans.len(), "parsed feature");
    Ok(plans)
}

fn background_steps(background: Option<&Background>) -> Vec<PlannedStep> {
    background
        .map(|bg| bg.steps.iter().map(PlannedStep::from_gherkin).collect())
        .unwrap_or_default()
}

struct Planner<'a> {
    path: &'a Path,
    feature: &'a Feature,
    placeholder: Regex,
}

impl Planner<'_> {
    fn plan(&self, scenario: &Scenario, background: &[PlannedStep], plans: &mut Vec<ScenarioPlan>) {
        if scenario.examples.is_empty() {
            let mut steps = background.to_vec();
            steps.extend(scenario.steps.iter().map(PlannedStep::from_gherkin));
            plans.push(self.scenario_plan(scenario.name.clone(), scenario.position.line, steps));
            return;
        }

        let mut ordinal = 0;
        for examples in &scenario.examples {
            let Some((header, rows)) = examples.table.as_ref().and_then(|t| t.rows.split_first())
            else {
                tracing::debug!(scenario = %scenario.name, "Examples without a table yield no scenarios");
                continue;
            };
            for (idx, row) in rows.iter().enumerate() {
                ordinal += 1;
                let values: Vec<(&str, &str)> = header
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter().map(String::as_str))
                    .collect();
                plans.push(self.example_plan(
                    scenario,
                    examples,
                    background,
                    &values,
                    ordinal,
                    examples.position.line + idx + 2,
                ));
            }
        }
    }

    fn example_plan(
        &self,
        scenario: &Scenario,
        examples: &Examples,
        background: &[PlannedStep],
        values: &[(&str, &str)],
        ordinal: usize,
        line: usize,
    ) -> ScenarioPlan {
        let name = self.fill(&scenario.name, values);
        let mut missing = name.as_ref().err().cloned();
        let mut steps = background.to_vec();
        for step in &scenario.steps {
            let mut planned = PlannedStep::from_gherkin(step);
            planned.text = self.fill_or_note(&planned.text, values, &mut missing);
            if let Some(docstring) = &planned.docstring {
                planned.docstring = Some(self.fill_or_note(docstring, values, &mut missing));
            }
            if let Some(rows) = &mut planned.table {
                for cell in rows.iter_mut().flatten() {
                    *cell = self.fill_or_note(cell, values, &mut missing);
                }
            }
            steps.push(planned);
        }

        let name = name.unwrap_or_else(|_| scenario.name.clone());
        let mut plan = self.scenario_plan(format!("{name} #{ordinal}"), line, steps);
        plan.invalid = missing.map(|column| {
            format!(
                "{} row {ordinal} references <{column}>, which is not an {} column",
                scenario.keyword.trim(),
                examples.keyword.trim()
            )
        });
        plan
    }

    fn scenario_plan(&self, name: String, line: usize, steps: Vec<PlannedStep>) -> ScenarioPlan {
        ScenarioPlan {
            path: self.path.to_path_buf(),
            feature: self.feature.name.clone(),
            name,
            line,
            steps,
            invalid: None,
        }
    }

    fn fill_or_note(&self, template: &str, values: &[(&str, &str)], missing: &mut Option<String>) -> String {
        self.fill(template, values).unwrap_or_else(|column| {
            if missing.is_none() {
                *missing = Some(column);
            }
            template.to_owned()
        })
    }

    /// Replace `<column>` references; `Err` names the first unknown column.
    fn fill(&self, template: &str, values: &[(&str, &str)]) -> Result<String, String> {
        let mut unknown = None;
        let filled = self.placeholder.replace_all(template, |caps: &Captures<'_>| {
            let column = caps.get(1).map_or("", |m| m.as_str());
            match values.iter().find(|(name, _)| *name == column) {
                Some((_, value)) => (*value).to_owned(),
                None => {
                    if unknown.is_none() {
                        unknown = Some(column.to_owned());
                    }
                    caps.get(0).map_or_else(String::new, |m| m.as_str().to_owned())
                }
            }
        });
        unknown.map_or_else(|| Ok(filled.into_owned()), Err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const ARITHMETIC: &str = "\
Feature: Arithmetic

  Background:
    Given the calculator is running

  Scenario: Add two numbers
    When I add 4 and 5
    Then the result should be 9

  Scenario: Chained checks
    When I multiply 2 and 3
    Then the result should be 6
    And the result should be 6
";

    fn parse(text: &str) -> Vec<ScenarioPlan> {
        parse_feature(text, Path::new("features/test.feature")).unwrap()
    }

    #[test]
    fn test_background_is_prepended() {
        let plans = parse(ARITHMETIC);
        assert_eq!(plans.len(), 2);

        let first = &plans[0];
        assert_eq!(first.feature, "Arithmetic");
        assert_eq!(first.name, "Add two numbers");
        assert_eq!(first.path, PathBuf::from("features/test.feature"));
        let texts: Vec<&str> = first.steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["the calculator is running", "I add 4 and 5", "the result should be 9"]
        );
        assert_eq!(first.steps[0].kind, StepKind::Given);
        assert_eq!(first.steps[1].kind, StepKind::When);
        assert_eq!(first.steps[2].kind, StepKind::Then);
        assert!(first.invalid.is_none());
    }

    #[test]
    fn test_and_inherits_previous_kind() {
        let plans = parse(ARITHMETIC);
        let last = plans[1].steps.last().unwrap();
        assert_eq!(last.keyword, "And");
        assert_eq!(last.kind, StepKind::Then);
        assert_eq!(last.display_text(), "And the result should be 6");
    }

    #[test]
    fn test_lines_are_recorded() {
        let plans = parse(ARITHMETIC);
        assert_eq!(plans[0].steps[1].line, plans[0].line + 1);
        assert!(plans[0].steps[0].line < plans[0].line);
        assert!(plans[0].line < plans[1].line);
    }

    #[test]
    fn test_rules_are_flattened_with_their_background() {
        let text = "\
Feature: Rules

  Background:
    Given the calculator is running

  Rule: division

    Background:
      When I divide 1 and 1

    Scenario: Divide by zero
      When I divide 7 and 0
      Then the calculator should report a division by zero error
";
        let plans = parse(text);
        assert_eq!(plans.len(), 1);
        let texts: Vec<&str> = plans[0].steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "the calculator is running",
                "I divide 1 and 1",
                "I divide 7 and 0",
                "the calculator should report a division by zero error",
            ]
        );
    }

    const OUTLINE: &str = "\
Feature: Outline

  Background:
    Given the calculator is running

  Scenario Outline: Add <a> and <b>
    When I add <a> and <b>
    Then the result should be <c>

    Examples:
      | a | b | c |
      | 4 | 5 | 9 |
      | 1 | 2 | 3 |

    Examples: more
      | a  | b | c  |
      | 10 | 1 | 11 |
";

    #[test]
    fn test_outline_expands_one_plan_per_row() {
        let plans = parse(OUTLINE);
        let names: Vec<&str> = plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Add 4 and 5 #1", "Add 1 and 2 #2", "Add 10 and 1 #3"]);
        assert!(plans.iter().all(|p| p.invalid.is_none()));

        let texts: Vec<&str> = plans[0].steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["the calculator is running", "I add 4 and 5", "the result should be 9"]
        );
    }

    #[test]
    fn test_outline_rows_point_at_their_table_line() {
        let plans = parse(OUTLINE);
        assert_eq!(plans[0].line, 12);
        assert_eq!(plans[1].line, 13);
        assert_eq!(plans[2].line, 17);
    }

    #[test]
    fn test_outline_fills_table_cells() {
        let text = "\
Feature: Outline table

  Scenario Outline: Table <op>
    When I evaluate the following:
      | operation | a | b | result |
      | <op>      | 6 | 3 | <r>    |

    Examples:
      | op     | r |
      | divide | 2 |
";
        let plans = parse(text);
        assert_eq!(plans.len(), 1);
        assert_eq!(
            plans[0].steps[0].table.as_deref().unwrap()[1],
            vec!["divide", "6", "3", "2"]
        );
    }

    #[test]
    fn test_unknown_outline_column_marks_plan_invalid() {
        let text = "\
Feature: Outline

  Scenario Outline: Add
    When I add <a> and <missing>

    Examples:
      | a |
      | 1 |
";
        let plans = parse(text);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].name, "Add #1");
        assert_eq!(
            plans[0].invalid.as_deref(),
            Some("Scenario Outline row 1 references <missing>, which is not an Examples column")
        );
    }

    #[test]
    fn test_step_table_and_docstring_are_kept() {
        let text = "\
Feature: Attachments

  Scenario: Table
    When I evaluate the following:
      | operation | a | b | result |
      | add       | 1 | 2 | 3      |
    Then the result should be 3
      \"\"\"
      a note
      \"\"\"
";
        let plans = parse(text);
        let table = plans[0].steps[0].table.as_ref().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0], vec!["operation", "a", "b", "result"]);
        assert!(plans[0].steps[1].docstring.as_deref().unwrap().contains("a note"));

        let input = plans[0].steps[0].input();
        assert_eq!(input.text, "I evaluate the following:");
        assert_eq!(input.table.map(<[Vec<String>]>::len), Some(2));
    }

    #[test]
    fn test_invalid_gherkin_is_a_parse_error() {
        let err = parse_feature("this is not gherkin", Path::new("bad.feature")).unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { .. }));
        assert!(err.to_string().starts_with("failed to parse bad.feature"));
    }

    #[test]
    fn test_load_missing_file_is_a_read_error() {
        let err = load_feature(Path::new("/nonexistent/x.feature")).unwrap_err();
        assert!(matches!(err, ScenarioError::Read { .. }));
    }
}
