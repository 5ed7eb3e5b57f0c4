//! Pass/fail rules for a received response
//!
//! No I/O. The runner captures status and body text; everything that decides
//! the verdict lives here so it can be exercised without a server.

use serde_json::Value;

use crate::config::Strictness;
use crate::request::{ScenarioKind, is_falsy};

pub const NON_EMPTY_ERRORS: &str = "Non-empty 'errors' found in response";
pub const ERROR_MISMATCH: &str = "Error mismatch in response body";
pub const PARSE_ERROR_PREFIX: &str = "response body parse error";

/// What a scenario expects back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectation {
    /// `None` never matches any status
    pub status: Option<u16>,
    /// Expected error response object; only its `errors` member is compared
    pub error_body: Option<Value>,
}

/// A response as received, before any judgement.
#[derive(Debug, Clone, Copy)]
pub struct ResponseCapture<'a> {
    pub status: u16,
    pub body_text: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub passed: bool,
    /// Body-level reasons, in the order the rules fired
    pub errors: Vec<String>,
    /// Response body, when it parsed as JSON
    pub parsed_body: Option<Value>,
}

/// Apply every rule to one response.
#[must_use]
pub fn evaluate(
    response: ResponseCapture<'_>,
    expectation: &Expectation,
    kind: ScenarioKind,
    strictness: Strictness,
) -> Evaluation {
    let mut errors = Vec::new();

    // ── Rule 1: body must be JSON ──
    let parsed_body = match parse_body(response.body_text) {
        Ok(v) => Some(v),
        Err(detail) => {
            errors.push(format!("{PARSE_ERROR_PREFIX}: {detail}"));
            None
        }
    };

    // ── Rule 2: status ──
    let status_ok = expectation.status == Some(response.status);

    let response_errors = parsed_body.as_ref().and_then(errors_field);

    // ── Rule 3: populated `errors` field ──
    let lenient_skip = strictness == Strictness::Lenient
        && kind == ScenarioKind::Sad
        && expectation.error_body.is_some();
    if !lenient_skip && response_errors.is_some_and(|e| !is_falsy(e)) {
        errors.push(NON_EMPTY_ERRORS.to_string());
    }

    // ── Rule 4: expected error body ──
    if let Some(expected) = &expectation.error_body {
        let expected_errors = errors_field(expected).unwrap_or(&Value::Null);
        let actual_errors = response_errors.unwrap_or(&Value::Null);
        if actual_errors != expected_errors {
            errors.push(ERROR_MISMATCH.to_string());
        }
    }

    Evaluation {
        passed: status_ok && errors.is_empty(),
        errors,
        parsed_body,
    }
}

fn parse_body(text: &str) -> Result<Value, String> {
    if text.trim().is_empty() {
        return Err("empty body".to_string());
    }
    serde_json::from_str(text).map_err(|e| e.to_string())
}

/// `errors` member of a JSON object; non-objects have none.
fn errors_field(body: &Value) -> Option<&Value> {
    body.as_object().and_then(|o| o.get("errors"))
}
