//! Per-scenario outcome, as handed to report sinks

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::evaluate::{Evaluation, ResponseCapture};
use crate::fixture::Method;
use crate::request::{Scenario, ScenarioKind, ScenarioRequest};

/// Headers masked in every request snapshot.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "x-auth-token",
    "cookie",
    "set-cookie",
    "proxy-authorization",
];

/// Mask value for redacted headers.
pub const MASK: &str = "***";

/// Marker written in place of a status when nothing came back.
pub const NO_RESPONSE: &str = "N/A";

/// Received status, or none at all.
///
/// Serialized as a bare number, or the string `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusCode {
    Received(u16),
    NoResponse,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received(code) => write!(f, "{code}"),
            Self::NoResponse => f.write_str(NO_RESPONSE),
        }
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Received(code) => serializer.serialize_u16(*code),
            Self::NoResponse => serializer.serialize_str(NO_RESPONSE),
        }
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) if s == NO_RESPONSE => Ok(Self::NoResponse),
            Value::Number(n) => n
                .as_u64()
                .and_then(|c| u16::try_from(c).ok())
                .map(Self::Received)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid status code {n}"))),
            other => Err(serde::de::Error::custom(format!(
                "expected status number or \"{NO_RESPONSE}\", got {other}"
            ))),
        }
    }
}

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    /// Scenario label ("Happy Path", "Sad Path" or the fixture's name)
    pub scenario: String,
    pub kind: ScenarioKind,
    /// Operation label, e.g. "GET /flights"
    pub endpoint: String,
    pub method: Method,
    pub url: String,
    /// Number, or "N/A" when no response was received
    #[schemars(with = "serde_json::Value")]
    pub status_code: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status_code: Option<u16>,
    pub passed: bool,
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
}

impl ScenarioResult {
    /// Result for a scenario that got an HTTP response.
    ///
    /// Snapshots are attached when the scenario failed or `include_bodies` is set.
    #[must_use]
    pub fn received(
        endpoint: String,
        scenario: &Scenario,
        request: &ScenarioRequest,
        response: ResponseCapture<'_>,
        evaluation: Evaluation,
        include_bodies: bool,
    ) -> Self {
        let mut result = Self::base(endpoint, scenario, request);
        result.status_code = StatusCode::Received(response.status);
        result.passed = evaluation.passed;
        result.errors = evaluation.errors;

        if !result.passed || include_bodies {
            result.attach_request(request);
            result.response_body = Some(match &evaluation.parsed_body {
                Some(v) => pretty(v),
                None => response.body_text.to_string(),
            });
        }
        result
    }

    /// Result for a scenario whose request never completed.
    #[must_use]
    pub fn no_response(
        endpoint: String,
        scenario: &Scenario,
        request: &ScenarioRequest,
        reason: String,
    ) -> Self {
        let mut result = Self::base(endpoint, scenario, request);
        result.errors = vec![reason];
        result.attach_request(request);
        result
    }

    fn base(endpoint: String, scenario: &Scenario, request: &ScenarioRequest) -> Self {
        Self {
            scenario: scenario.label.clone(),
            kind: scenario.kind,
            endpoint,
            method: request.method,
            url: request.url.clone(),
            status_code: StatusCode::NoResponse,
            expected_status_code: scenario.expectation.status,
            passed: false,
            errors: Vec::new(),
            request_headers: None,
            request_body: None,
            response_body: None,
        }
    }

    fn attach_request(&mut self, request: &ScenarioRequest) {
        self.request_headers = Some(mask_headers(&request.headers));
        self.request_body = request.body.as_ref().map(pretty);
    }

    /// Whether any snapshot was captured.
    #[must_use]
    pub const fn has_snapshot(&self) -> bool {
        self.request_headers.is_some()
    }
}

fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

/// Returns true if the header name matches a known sensitive header (case-insensitive).
#[must_use]
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|&h| name.eq_ignore_ascii_case(h))
}

/// Header snapshot in send order with sensitive values replaced by [`MASK`].
#[must_use]
pub fn mask_headers(headers: &[(String, String)]) -> Map<String, Value> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if is_sensitive_header(name) {
                MASK
            } else {
                value.as_str()
            };
            (name.clone(), Value::String(shown.to_string()))
        })
        .collect()
}
