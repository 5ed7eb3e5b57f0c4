//! Report sinks: render the ordered result list to a file
//!
//! ```text
//! API Contract Test Report
//! ========================
//!
//! Scenario: Happy Path
//! Method: GET
//! URL: http://localhost:8080/flights?from=DEL
//! Status Code: 200
//! Passed: true
//! Errors: None
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fixture::TestCase;
use crate::result::ScenarioResult;
use crate::summary::{RunSummary, format_distribution};

pub const REPORT_TITLE: &str = "API Contract Test Report";

/// Everything a sink receives: summary plus results in fixture order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContractReport {
    pub summary: RunSummary,
    pub results: Vec<ScenarioResult>,
}

impl ContractReport {
    #[must_use]
    pub fn new(cases: &[TestCase], results: Vec<ScenarioResult>) -> Self {
        Self {
            summary: RunSummary::compute(cases, &results),
            results,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    /// `.json` → JSON, anything else → text.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Consumer of a finished run.
pub trait ReportSink {
    /// # Errors
    ///
    /// Returns error if the report cannot be rendered or written
    fn write(&self, report: &ContractReport) -> Result<(), ReportError>;
}

/// Plain-text document, one block per scenario.
#[derive(Debug, Clone)]
pub struct TextReportSink {
    path: PathBuf,
}

impl TextReportSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for TextReportSink {
    fn write(&self, report: &ContractReport) -> Result<(), ReportError> {
        write_file(&self.path, &render_text(report))
    }
}

/// Pretty-printed [`ContractReport`] JSON.
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonReportSink {
    fn write(&self, report: &ContractReport) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| ReportError::Serialize(e.to_string()))?;
        write_file(&self.path, &json)
    }
}

/// Sink for `path`, using `format` when given, else the file extension.
#[must_use]
pub fn sink_for_path(path: &Path, format: Option<ReportFormat>) -> Box<dyn ReportSink> {
    match format.unwrap_or_else(|| ReportFormat::from_path(path)) {
        ReportFormat::Text => Box::new(TextReportSink::new(path)),
        ReportFormat::Json => Box::new(JsonReportSink::new(path)),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ReportError::Io(parent.to_path_buf(), e.to_string()))?;
    }
    std::fs::write(path, content).map_err(|e| ReportError::Io(path.to_path_buf(), e.to_string()))
}

/// Render the text report.
#[must_use]
pub fn render_text(report: &ContractReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{REPORT_TITLE}");
    let _ = writeln!(out, "{}", "=".repeat(REPORT_TITLE.len()));

    for r in &report.results {
        out.push('\n');
        let errors = if r.errors.is_empty() {
            "None".to_string()
        } else {
            r.errors.join(", ")
        };
        let _ = writeln!(out, "Scenario: {}", r.scenario);
        let _ = writeln!(out, "Method: {}", r.method);
        let _ = writeln!(out, "URL: {}", r.url);
        let _ = writeln!(out, "Status Code: {}", r.status_code);
        let _ = writeln!(out, "Passed: {}", r.passed);
        let _ = writeln!(out, "Errors: {errors}");

        if let Some(headers) = &r.request_headers {
            if !headers.is_empty() {
                let _ = writeln!(out, "Request Headers:");
                for (name, value) in headers {
                    let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                    let _ = writeln!(out, "  {name}: {value}");
                }
            }
        }
        if let Some(body) = &r.request_body {
            let _ = writeln!(out, "Request Body:");
            push_indented(&mut out, body);
        }
        if let Some(body) = &r.response_body {
            let _ = writeln!(out, "Response Body:");
            push_indented(&mut out, body);
        }
    }

    out.push('\n');
    out.push_str(&render_summary(&report.summary));
    out
}

/// Summary block, also printed to the terminal after a run.
#[must_use]
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Summary");
    let _ = writeln!(out, "=======");
    let _ = writeln!(
        out,
        "Scenarios: {}, passed: {}, failed: {}, no response: {}",
        summary.total_scenarios, summary.passed, summary.failed, summary.no_response
    );
    let _ = writeln!(
        out,
        "Cases: {}, skipped: {}",
        summary.total_cases, summary.skipped_cases
    );
    for e in &summary.endpoints {
        let _ = writeln!(
            out,
            "{}: {}/{} passed ({})",
            e.endpoint,
            e.passed,
            e.total,
            format_distribution(&e.status_distribution)
        );
    }
    out
}

fn push_indented(out: &mut String, text: &str) {
    for line in text.lines() {
        let _ = writeln!(out, "  {line}");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Cannot write report {0}: {1}")]
    Io(PathBuf, String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{Method, parse_fixture};
    use crate::request::ScenarioKind;
    use crate::result::StatusCode;
    use serde_json::{Map, Value};

    fn report() -> ContractReport {
        let cases = parse_fixture(
            Path::new("t.json"),
            r#"[{"sampleRequest": {"method": "GET", "url": "/flights"}}]"#,
        )
        .unwrap();

        let passed = ScenarioResult {
            scenario: "Happy Path".into(),
            kind: ScenarioKind::Happy,
            endpoint: "GET /flights".into(),
            method: Method::Get,
            url: "http://h/flights?from=DEL".into(),
            status_code: StatusCode::Received(200),
            expected_status_code: Some(200),
            passed: true,
            errors: vec![],
            request_headers: None,
            request_body: None,
            response_body: None,
        };
        let mut headers = Map::new();
        headers.insert("Authorization".into(), Value::String("***".into()));
        let failed = ScenarioResult {
            scenario: "missing origin".into(),
            kind: ScenarioKind::Sad,
            url: "http://h/flights".into(),
            status_code: StatusCode::Received(400),
            expected_status_code: Some(400),
            passed: false,
            errors: vec!["Error mismatch in response body".into()],
            request_headers: Some(headers),
            response_body: Some("{\n  \"errors\": []\n}".into()),
            ..passed.clone()
        };

        ContractReport::new(&cases, vec![passed, failed])
    }

    #[test]
    fn text_report_layout() {
        insta::assert_snapshot!(render_text(&report()), @r#"
        API Contract Test Report
        ========================

        Scenario: Happy Path
        Method: GET
        URL: http://h/flights?from=DEL
        Status Code: 200
        Passed: true
        Errors: None

        Scenario: missing origin
        Method: GET
        URL: http://h/flights
        Status Code: 400
        Passed: false
        Errors: Error mismatch in response body
        Request Headers:
          Authorization: ***
        Response Body:
          {
            "errors": []
          }

        Summary
        =======
        Scenarios: 2, passed: 1, failed: 1, no response: 0
        Cases: 1, skipped: 0
        GET /flights: 1/2 passed (200x1, 400x1)
        "#);
    }

    #[test]
    fn no_response_and_joined_errors_in_text() {
        let mut r = report();
        r.results[1].status_code = StatusCode::NoResponse;
        r.results[1].errors = vec!["a".into(), "b".into()];
        let text = render_text(&r);
        assert!(text.contains("Status Code: N/A\n"));
        assert!(text.contains("Errors: a, b\n"));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ReportFormat::from_path(Path::new("r.json")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("r.JSON")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("r.txt")), ReportFormat::Text);
        assert_eq!(ReportFormat::from_path(Path::new("report")), ReportFormat::Text);
    }

    #[test]
    fn json_sink_writes_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/report.json");
        sink_for_path(&path, None).write(&report()).unwrap();

        let written: ContractReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report());

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["results"][0]["statusCode"], 200);
        assert_eq!(raw["summary"]["failed"], 1);
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        sink_for_path(&path, Some(ReportFormat::Text))
            .write(&report())
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(REPORT_TITLE));
    }

    #[test]
    fn unwritable_path_is_report_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let err = TextReportSink::new(blocker.join("report.txt"))
            .write(&report())
            .unwrap_err();
        assert!(matches!(err, ReportError::Io(..)));
    }
}
