//! Dry run plan types and config validation
//!
//! Describes what a run *would* send without sending any requests.
//! Used for pre-flight validation and CI previews.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::fixture::{FixtureShape, TestCase};
use crate::request::{RequestSynthesizer, ScenarioKind, scenarios_for};

// ── Plan types ──

/// Complete dry run plan: cases, skipped cases, and config warnings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DryRunPlan {
    /// Cases that would run, in fixture order
    pub cases: Vec<CasePlan>,
    /// Cases excluded for lack of a recognized method
    pub skipped: Vec<SkippedCase>,
    /// Total scenarios (= requests) that would be sent
    pub total_scenarios: u64,
    /// Config validation results
    pub validations: Vec<Validation>,
}

/// Execution plan for a single case.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CasePlan {
    /// Operation label, e.g. "GET /flights"
    pub endpoint: String,
    /// "file.json#3"
    pub source: String,
    pub shape: FixtureShape,
    pub scenarios: Vec<PlannedScenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlannedScenario {
    pub label: String,
    pub kind: ScenarioKind,
    /// Fully synthesized URL, query string included
    pub url: String,
    pub expected_status: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SkippedCase {
    pub source: String,
    pub reason: String,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: String) -> Self {
        Self {
            check: check.into(),
            status,
            message,
        }
    }
}

// ── Plan building ──

impl DryRunPlan {
    /// Plan the run for already-loaded cases.
    #[must_use]
    pub fn build(config: &Config, cases: &[TestCase]) -> Self {
        let synth = RequestSynthesizer::from_config(config);
        let mut planned = Vec::new();
        let mut skipped = Vec::new();
        let mut total_scenarios = 0u64;

        for case in cases {
            let source = format!("{}#{}", case.source.file.display(), case.source.index);
            if let Some(reason) = case.skip_reason() {
                skipped.push(SkippedCase { source, reason });
                continue;
            }

            let scenarios: Vec<PlannedScenario> = scenarios_for(case)
                .iter()
                .filter_map(|s| {
                    let request = synth.synthesize(case, s)?;
                    Some(PlannedScenario {
                        label: s.label.clone(),
                        kind: s.kind,
                        url: request.url,
                        expected_status: s.expectation.status,
                    })
                })
                .collect();
            total_scenarios += scenarios.len() as u64;

            planned.push(CasePlan {
                endpoint: case.endpoint(),
                source,
                shape: case.shape,
                scenarios,
            });
        }

        Self {
            cases: planned,
            skipped,
            total_scenarios,
            validations: validate_config(config),
        }
    }
}

// ── Config validation ──

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-token",
    "your_token",
    "YOUR_TOKEN",
    "your-api-key",
    "YOUR_API_KEY",
    "CHANGEME",
    "changeme",
    "placeholder",
    "xxx",
    "XXX",
    "replace-me",
    "REPLACE_ME",
];

/// Validate config and produce validation results.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let mut checks = Vec::new();

    // Fixture files
    if config.fixtures.is_empty() {
        checks.push(Validation::new(
            "fixtures",
            ValidationStatus::Error,
            "fixtures: none configured".into(),
        ));
    }
    for path in &config.fixtures {
        let (status, note) = if path.exists() {
            (ValidationStatus::Ok, "exists")
        } else {
            (ValidationStatus::Error, "not found")
        };
        checks.push(Validation::new(
            "fixtures",
            status,
            format!("fixture: {} ({note})", path.display()),
        ));
    }

    // Base URL
    if config.base_url.starts_with("http://") || config.base_url.starts_with("https://") {
        checks.push(Validation::new(
            "base_url",
            ValidationStatus::Ok,
            format!("base_url: {}", config.base_url),
        ));
    } else {
        checks.push(Validation::new(
            "base_url",
            ValidationStatus::Warning,
            format!(
                "base_url: {} (missing http:// or https:// prefix)",
                config.base_url
            ),
        ));
    }

    // Headers: look for placeholders
    let mut header_issues = Vec::new();
    for (key, value) in &config.headers {
        if value.contains('<') && value.contains('>') {
            header_issues.push(format!("{key}: contains '<...>' placeholder"));
        } else if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| value.contains(*p)) {
            header_issues.push(format!("{key}: contains '{pattern}', may be a placeholder"));
        }
    }
    if header_issues.is_empty() {
        checks.push(Validation::new(
            "headers",
            ValidationStatus::Ok,
            format!("headers: {} configured", config.headers.len()),
        ));
    } else {
        for issue in header_issues {
            checks.push(Validation::new("headers", ValidationStatus::Warning, issue));
        }
    }

    // Timeout
    if config.request_timeout.is_finite() && config.request_timeout > 0.0 {
        checks.push(Validation::new(
            "request_timeout",
            ValidationStatus::Ok,
            format!("request_timeout: {}s", config.request_timeout),
        ));
    } else {
        checks.push(Validation::new(
            "request_timeout",
            ValidationStatus::Warning,
            format!(
                "request_timeout: {} (not positive, default {}s used)",
                config.request_timeout,
                config.timeout().as_secs_f64()
            ),
        ));
    }

    // Workers
    if config.workers == 0 {
        checks.push(Validation::new(
            "workers",
            ValidationStatus::Warning,
            "workers: 0 (running sequentially)".into(),
        ));
    } else {
        checks.push(Validation::new(
            "workers",
            ValidationStatus::Ok,
            format!("workers: {}", config.workers),
        ));
    }

    checks
}

// ── Display helpers ──

impl DryRunPlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Dry run: {} cases, {} scenarios planned, {} skipped\n",
            self.cases.len(),
            self.total_scenarios,
            self.skipped.len(),
        ));

        for case in &self.cases {
            lines.push(format!(
                "{} [{}] ({} scenarios):",
                case.endpoint,
                case.source,
                case.scenarios.len()
            ));
            for s in &case.scenarios {
                let expected = s
                    .expected_status
                    .map_or_else(|| "?".to_string(), |c| c.to_string());
                lines.push(format!("  {} -> {expected}  {}", s.label, s.url));
            }
            lines.push(String::new());
        }

        if !self.skipped.is_empty() {
            lines.push("Skipped:".into());
            for s in &self.skipped {
                lines.push(format!("  {}: {}", s.source, s.reason));
            }
            lines.push(String::new());
        }

        lines.push("Config validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::parse_fixture;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    fn config_with_headers(headers: BTreeMap<String, String>) -> Config {
        Config {
            base_url: "http://localhost:8080".into(),
            fixtures: vec![PathBuf::from("nonexistent.json")],
            headers,
            ..Config::default()
        }
    }

    fn header_warnings(checks: &[Validation]) -> usize {
        checks
            .iter()
            .filter(|c| c.check == "headers" && c.status == ValidationStatus::Warning)
            .count()
    }

    #[test]
    fn validate_placeholder_angle_brackets() {
        let h = BTreeMap::from([("Authorization".into(), "Bearer <your-token-here>".into())]);
        assert_eq!(header_warnings(&validate_config(&config_with_headers(h))), 1);
    }

    #[test]
    fn validate_placeholder_pattern() {
        let h = BTreeMap::from([("X-API-Key".into(), "YOUR_TOKEN_HERE".into())]);
        assert_eq!(header_warnings(&validate_config(&config_with_headers(h))), 1);
    }

    #[test]
    fn validate_real_header_ok() {
        let h = BTreeMap::from([("Authorization".into(), "Bearer eyJhbGciOi".into())]);
        assert_eq!(header_warnings(&validate_config(&config_with_headers(h))), 0);
    }

    #[test]
    fn missing_fixture_is_error() {
        let checks = validate_config(&config_with_headers(BTreeMap::new()));
        assert!(
            checks
                .iter()
                .any(|c| c.check == "fixtures" && c.status == ValidationStatus::Error)
        );
    }

    #[test]
    fn existing_fixture_ok_and_bad_scheme_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.json");
        std::fs::write(&path, "[]").unwrap();
        let config = Config {
            base_url: "localhost:8080".into(),
            fixtures: vec![path],
            request_timeout: -1.0,
            workers: 0,
            ..Config::default()
        };
        let checks = validate_config(&config);
        let status = |name: &str| {
            checks
                .iter()
                .find(|c| c.check == name)
                .map(|c| c.status)
                .unwrap()
        };
        assert_eq!(status("fixtures"), ValidationStatus::Ok);
        assert_eq!(status("base_url"), ValidationStatus::Warning);
        assert_eq!(status("request_timeout"), ValidationStatus::Warning);
        assert_eq!(status("workers"), ValidationStatus::Warning);
    }

    #[test]
    fn plan_lists_scenarios_and_skipped_cases() {
        let cases = parse_fixture(
            Path::new("flights.json"),
            r#"[
                {"sampleRequest": {"method": "GET", "url": "/flights", "query": {"from": "DEL", "to": ""}},
                 "happyPathTests": [{"summary": "one-way", "expectedStatusCode": 200}],
                 "sadPathTests": [{"scenario": "missing origin", "badRequest": {"query": {"from": ""}},
                                   "expectedErrorResponse": {"statusCode": 400}}]},
                {"httpVerb": "OPTIONS", "route": "/flights"}
            ]"#,
        )
        .unwrap();
        let config = Config {
            base_url: "http://api".into(),
            ..Config::default()
        };

        let plan = DryRunPlan::build(&config, &cases);
        assert_eq!(plan.total_scenarios, 2);
        assert_eq!(plan.cases.len(), 1);
        assert_eq!(plan.cases[0].endpoint, "GET /flights");
        assert_eq!(plan.cases[0].source, "flights.json#0");
        assert_eq!(plan.cases[0].scenarios[0].url, "http://api/flights?from=DEL");
        assert_eq!(plan.cases[0].scenarios[1].url, "http://api/flights");
        assert_eq!(plan.cases[0].scenarios[1].expected_status, Some(400));

        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].reason, "unrecognized method 'OPTIONS'");

        let text = plan.to_terminal();
        assert!(text.contains("Dry run: 1 cases, 2 scenarios planned, 1 skipped"));
        assert!(text.contains("  one-way -> 200  http://api/flights?from=DEL"));
        assert!(text.contains("flights.json#1: unrecognized method 'OPTIONS'"));
        assert!(plan.has_errors());
    }
}
