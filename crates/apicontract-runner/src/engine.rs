//! Result aggregation: every scenario of every case, in fixture order
//!
//! Scenarios of one case always run sequentially. With more than one worker,
//! whole cases are spread over a bounded set of scoped threads and the
//! results are put back into fixture order before they are returned.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use apicontract_core::{
    Config, ContractReport, RequestSynthesizer, ScenarioResult, TestCase, scenarios_for,
};

use crate::evaluator::ContractEvaluator;
use crate::observer::{ScenarioObserver, TracingObserver};

pub struct ContractRunner {
    synthesizer: RequestSynthesizer,
    evaluator: ContractEvaluator,
    workers: usize,
    observer: Arc<dyn ScenarioObserver>,
}

impl ContractRunner {
    #[must_use]
    pub fn new(synthesizer: RequestSynthesizer, evaluator: ContractEvaluator) -> Self {
        Self {
            synthesizer,
            evaluator,
            workers: 1,
            observer: Arc::new(TracingObserver),
        }
    }

    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn from_config(config: &Config) -> Result<Self, RunnerError> {
        Ok(Self::new(
            RequestSynthesizer::from_config(config),
            ContractEvaluator::from_config(config)?,
        )
        .with_workers(config.worker_count()))
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScenarioObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run all cases and return results in fixture order.
    #[must_use]
    pub fn run(&self, cases: &[TestCase]) -> Vec<ScenarioResult> {
        let runnable = cases.iter().filter(|c| c.method.is_some()).count();
        tracing::info!(
            cases = cases.len(),
            runnable,
            workers = self.workers,
            "starting contract run"
        );

        let results = if self.workers == 1 || cases.len() <= 1 {
            cases.iter().flat_map(|case| self.run_case(case)).collect()
        } else {
            self.run_parallel(cases)
        };

        let passed = results.iter().filter(|r| r.passed).count();
        tracing::info!(
            scenarios = results.len(),
            passed,
            failed = results.len() - passed,
            "contract run finished"
        );
        results
    }

    /// [`run`](Self::run) plus summary.
    #[must_use]
    pub fn run_report(&self, cases: &[TestCase]) -> ContractReport {
        ContractReport::new(cases, self.run(cases))
    }

    /// Scenarios of one case, happy paths first. Skipped cases yield nothing.
    fn run_case(&self, case: &TestCase) -> Vec<ScenarioResult> {
        if let Some(reason) = case.skip_reason() {
            self.observer.on_skip(case, &reason);
            return Vec::new();
        }

        let endpoint = case.endpoint();
        scenarios_for(case)
            .iter()
            .filter_map(|scenario| {
                let request = self.synthesizer.synthesize(case, scenario)?;
                let result = self
                    .evaluator
                    .evaluate(endpoint.clone(), scenario, &request);
                self.observer.on_result(case, &result);
                Some(result)
            })
            .collect()
    }

    fn run_parallel(&self, cases: &[TestCase]) -> Vec<ScenarioResult> {
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, Vec<ScenarioResult>)>();
        let workers = self.workers.min(cases.len());

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || {
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(case) = cases.get(idx) else {
                            break;
                        };
                        if tx.send((idx, self.run_case(case))).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Vec<ScenarioResult>> = vec![Vec::new(); cases.len()];
        for (idx, results) in rx {
            slots[idx] = results;
        }
        slots.into_iter().flatten().collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("HTTP client error: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicontract_core::parse_fixture;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        skipped: Mutex<Vec<String>>,
        seen: Mutex<usize>,
    }

    impl ScenarioObserver for Recorder {
        fn on_result(&self, _case: &TestCase, _result: &ScenarioResult) {
            *self.seen.lock().unwrap() += 1;
        }

        fn on_skip(&self, _case: &TestCase, reason: &str) {
            self.skipped.lock().unwrap().push(reason.to_string());
        }
    }

    fn runner(observer: Arc<Recorder>) -> ContractRunner {
        let evaluator = ContractEvaluator::new(std::time::Duration::from_millis(200)).unwrap();
        ContractRunner::new(RequestSynthesizer::new("http://127.0.0.1:9"), evaluator)
            .with_observer(observer)
    }

    #[test]
    fn skipped_cases_send_nothing() {
        let cases = parse_fixture(
            Path::new("t.json"),
            r#"[{"httpVerb": "HEAD", "route": "/x", "sampleRequest": {},
                 "happyPathTest": {"expectedStatusCode": 200}},
                {"sampleRequest": {"url": "/y"}}]"#,
        )
        .unwrap();
        let recorder = Arc::new(Recorder::default());

        let results = runner(recorder.clone()).run(&cases);
        assert!(results.is_empty());
        assert_eq!(
            *recorder.skipped.lock().unwrap(),
            vec!["unrecognized method 'HEAD'", "no method declared"]
        );
        assert_eq!(*recorder.seen.lock().unwrap(), 0);
    }

    #[test]
    fn zero_workers_clamped_to_one() {
        let r = runner(Arc::new(Recorder::default())).with_workers(0);
        assert_eq!(r.workers, 1);
    }
}
