//! Scenario execution.
//!
//! Every scenario gets a fresh [`ScenarioContext`] and runs on a blocking
//! worker under a timeout. A failure, a panic, or a timeout marks that one
//! scenario failed; the rest of the suite keeps going.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use calculator::steps::{ScenarioContext, StepRegistry};
use calculator_sdk::CalculatorClientV1;
use futures::stream::{self, StreamExt};

use crate::parser::ScenarioPlan;
use crate::report::ScenarioReport;

/// Knobs for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSettings {
    pub tolerance: f64,
    pub scenario_timeout: Duration,
    pub concurrency: usize,
}

/// Drive `future` on a fresh multi-thread runtime, then drop the runtime
/// without joining its blocking workers.
///
/// A timed-out scenario leaves its worker running; waiting for it here would
/// hold the process open past the timeout.
///
/// # Errors
///
/// Returns an error if the runtime cannot be built.
pub fn block_on_detached<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

/// Run all plans, at most `concurrency` at a time.
///
/// Reports come back in the same order as `plans`.
pub async fn run_scenarios(
    plans: Vec<ScenarioPlan>,
    registry: &Arc<StepRegistry>,
    client: &Arc<dyn CalculatorClientV1>,
    settings: RunSettings,
) -> Vec<ScenarioReport> {
    stream::iter(plans)
        .map(|plan| run_guarded(plan, Arc::clone(registry), Arc::clone(client), settings))
        .buffered(settings.concurrency.max(1))
        .collect()
        .await
}

async fn run_guarded(
    plan: ScenarioPlan,
    registry: Arc<StepRegistry>,
    client: Arc<dyn CalculatorClientV1>,
    settings: RunSettings,
) -> ScenarioReport {
    let base = ScenarioReport::for_plan(&plan);
    let task = tokio::task::spawn_blocking(move || {
        execute(&plan, &registry, client, settings.tolerance)
    });

    match tokio::time::timeout(settings.scenario_timeout, task).await {
        Ok(Ok(report)) => report,
        Ok(Err(join_err)) => {
            tracing::error!(scenario = %base.scenario, error = %join_err, "scenario panicked");
            base.failed_at(None, format!("scenario panicked: {join_err}"))
        }
        Err(_elapsed) => {
            tracing::warn!(scenario = %base.scenario, "scenario timed out");
            let millis = settings.scenario_timeout.as_millis();
            base.failed_at(None, format!("timed out after {millis} ms"))
        }
    }
}

/// Execute one scenario synchronously.
///
/// Steps run in order; the first failing step stops the scenario.
#[must_use]
pub fn execute(
    plan: &ScenarioPlan,
    registry: &StepRegistry,
    client: Arc<dyn CalculatorClientV1>,
    tolerance: f64,
) -> ScenarioReport {
    let mut report = ScenarioReport::for_plan(plan);

    if let Some(reason) = &plan.invalid {
        return report.failed_at(None, reason.clone());
    }

    let mut ctx = ScenarioContext::new(client, tolerance);
    for step in &plan.steps {
        if let Err(failure) = registry.dispatch(&mut ctx, step.kind, &step.input()) {
            tracing::info!(
                scenario = %plan.name,
                step = %step.display_text(),
                %failure,
                "step failed"
            );
            return report.failed_at(Some(step), failure.to_string());
        }
        report.steps_passed += 1;
    }

    tracing::debug!(scenario = %plan.name, steps = report.steps_passed, "scenario passed");
    report
}
