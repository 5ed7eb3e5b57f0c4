//! Per-scenario hook, called as each result is produced
//!
//! Observers run on worker threads when the runner is parallel, so they must
//! be `Send + Sync`. They see results in completion order, which only matches
//! fixture order for sequential runs.

use apicontract_core::{ScenarioResult, TestCase};

pub trait ScenarioObserver: Send + Sync {
    fn on_result(&self, case: &TestCase, result: &ScenarioResult);

    /// Case excluded from the run (no recognized method).
    fn on_skip(&self, _case: &TestCase, _reason: &str) {}
}

/// Logs one `tracing` event per scenario: info on pass, warn on failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ScenarioObserver for TracingObserver {
    fn on_result(&self, case: &TestCase, result: &ScenarioResult) {
        if result.passed {
            tracing::info!(
                scenario = %result.scenario,
                method = %result.method,
                url = %result.url,
                status = %result.status_code,
                "scenario passed"
            );
        } else {
            tracing::warn!(
                scenario = %result.scenario,
                method = %result.method,
                url = %result.url,
                status = %result.status_code,
                expected = ?result.expected_status_code,
                errors = ?result.errors,
                fixture = %case.source.file.display(),
                case = case.source.index,
                "scenario failed"
            );
        }
    }

    fn on_skip(&self, case: &TestCase, reason: &str) {
        tracing::warn!(
            fixture = %case.source.file.display(),
            case = case.source.index,
            reason,
            "skipping case"
        );
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScenarioObserver for NoopObserver {
    fn on_result(&self, _case: &TestCase, _result: &ScenarioResult) {}
}
