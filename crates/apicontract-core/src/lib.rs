//! apicontract-core: Fixture model and contract rules for HTTP contract testing
//!
//! This crate holds everything that does not touch the network: loading fixture
//! documents, turning each scenario into a concrete request, judging a captured
//! response, and rendering the ordered results.

pub mod config;
pub mod dryrun;
pub mod evaluate;
pub mod fixture;
pub mod report;
pub mod reproduce;
pub mod request;
pub mod result;
pub mod schema;
pub mod summary;

pub use config::{Config, ConfigError, Strictness};
pub use dryrun::DryRunPlan;
pub use evaluate::{Evaluation, Expectation, ResponseCapture, evaluate};
pub use fixture::{FixtureError, FixtureShape, Method, TestCase, load_fixtures, parse_fixture};
pub use report::{ContractReport, ReportError, ReportFormat, ReportSink, sink_for_path};
pub use reproduce::to_http_file;
pub use request::{RequestSynthesizer, Scenario, ScenarioKind, ScenarioRequest, scenarios_for};
pub use result::{ScenarioResult, StatusCode};
pub use summary::RunSummary;
