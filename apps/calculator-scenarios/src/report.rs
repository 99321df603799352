//! Scenario outcomes and their human/JSON rendering.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;

use crate::error::ScenarioError;
use crate::parser::{PlannedStep, ScenarioPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
}

/// Where and why a scenario failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    /// The failing step as written, when a step is to blame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Line number (1-indexed) of the step or scenario; 0 for file-level errors
    pub line: usize,
    pub message: String,
}

/// Outcome of one scenario (or of one feature file that could not be loaded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub file: PathBuf,
    pub feature: String,
    pub scenario: String,
    pub line: usize,
    pub status: ScenarioStatus,
    pub steps_total: usize,
    pub steps_passed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,
}

impl ScenarioReport {
    /// A passing report with no steps run yet.
    #[must_use]
    pub fn for_plan(plan: &ScenarioPlan) -> Self {
        Self {
            file: plan.path.clone(),
            feature: plan.feature.clone(),
            scenario: plan.name.clone(),
            line: plan.line,
            status: ScenarioStatus::Passed,
            steps_total: plan.steps.len(),
            steps_passed: 0,
            failure: None,
        }
    }

    /// A feature file that never produced scenarios.
    #[must_use]
    pub fn unloadable(path: &Path, error: &ScenarioError) -> Self {
        Self {
            file: path.to_path_buf(),
            feature: String::new(),
            scenario: String::new(),
            line: 0,
            status: ScenarioStatus::Failed,
            steps_total: 0,
            steps_passed: 0,
            failure: Some(FailureDetail {
                step: None,
                line: 0,
                message: error.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn failed_at(mut self, step: Option<&PlannedStep>, message: impl Into<String>) -> Self {
        self.status = ScenarioStatus::Failed;
        self.failure = Some(FailureDetail {
            step: step.map(PlannedStep::display_text),
            line: step.map_or(self.line, |s| s.line),
            message: message.into(),
        });
        self
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }

    /// Format the failure for human-readable output.
    ///
    /// `{file}:{line}: {feature} / {scenario}: {message} [{step}]`
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        let Some(failure) = &self.failure else {
            return format!(
                "{}:{}: {} / {}",
                self.file.display(),
                self.line,
                self.feature,
                self.scenario
            );
        };
        let location = if failure.line > 0 {
            format!("{}:{}", self.file.display(), failure.line)
        } else {
            self.file.display().to_string()
        };
        let scope = if self.scenario.is_empty() {
            String::new()
        } else {
            format!("{} / {}: ", self.feature, self.scenario)
        };
        let step = failure
            .step
            .as_ref()
            .map_or_else(String::new, |step| format!(" [{step}]"));
        format!("{location}: {scope}{}{step}", failure.message)
    }
}

/// Totals over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub scenarios: usize,
    pub passed: usize,
    pub failed: usize,
    pub steps_passed: usize,
}

impl Summary {
    #[must_use]
    pub fn from_reports(files: usize, reports: &[ScenarioReport]) -> Self {
        let passed = reports.iter().filter(|r| r.passed()).count();
        Self {
            files,
            scenarios: reports.len(),
            passed,
            failed: reports.len() - passed,
            steps_passed: reports.iter().map(|r| r.steps_passed).sum(),
        }
    }

    #[must_use]
    pub const fn ok(&self) -> bool {
        self.failed == 0
    }
}

/// Render the run as JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(summary: &Summary, reports: &[ScenarioReport]) -> serde_json::Result<String> {
    let output = serde_json::json!({
        "summary": summary,
        "ok": summary.ok(),
        "scenarios": reports,
    });
    serde_json::to_string_pretty(&output)
}

pub fn print_results(summary: &Summary, reports: &[ScenarioReport], verbose: bool) {
    println!();
    println!("{}", "=".repeat(80));
    println!("  {}", "CALCULATOR SCENARIOS".bold());
    println!("{}", "=".repeat(80));
    println!();
    println!("  Feature files: {}", summary.files);
    println!("  Scenarios:     {}", summary.scenarios);
    println!("  Steps passed:  {}", summary.steps_passed);
    println!();

    if verbose {
        for report in reports.iter().filter(|r| r.passed()) {
            println!("  {} {}", "ok".green(), report.format_human_readable());
        }
        println!();
    }

    if !summary.ok() {
        println!("{}", "-".repeat(80));
        println!("  {}", "FAILURES".red().bold());
        println!("{}", "-".repeat(80));

        for report in reports.iter().filter(|r| !r.passed()) {
            println!("{}", report.format_human_readable().red());
        }
        println!();
    }

    println!("{}", "=".repeat(80));
    if summary.ok() {
        println!(
            "{}",
            format!("All {} scenarios passed", summary.passed).green()
        );
    } else {
        println!(
            "{}",
            format!(
                "{} passed, {} failed",
                summary.passed, summary.failed
            )
            .red()
        );
    }
    println!("{}", "=".repeat(80));
}
