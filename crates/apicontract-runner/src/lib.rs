//! apicontract-runner: contract scenario execution over HTTP

pub mod engine;
pub mod evaluator;
pub mod observer;

pub use engine::{ContractRunner, RunnerError};
pub use evaluator::ContractEvaluator;
pub use observer::{NoopObserver, ScenarioObserver, TracingObserver};
