//! Request synthesis: test case + scenario → concrete HTTP request
//!
//! Pure data transformation. Nothing here validates headers or bodies; a
//! malformed header only surfaces once the request is actually sent.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::config::Config;
use crate::evaluate::Expectation;
use crate::fixture::{Method, RequestOverride, TestCase};

/// Label used when a happy path has no `summary`.
pub const HAPPY_PATH_LABEL: &str = "Happy Path";
/// Label used when a sad path has no `scenario` name.
pub const SAD_PATH_LABEL: &str = "Sad Path";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Happy,
    Sad,
}

/// One request/expectation pair derived from a test case.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub label: String,
    pub expectation: Expectation,
    pub override_request: Option<RequestOverride>,
}

/// Scenarios of a case in run order: happy paths, then sad paths.
///
/// Skipped cases (no recognized method) yield nothing.
#[must_use]
pub fn scenarios_for(case: &TestCase) -> Vec<Scenario> {
    if case.method.is_none() {
        return Vec::new();
    }

    let happy = case.happy_paths.iter().map(|h| Scenario {
        kind: ScenarioKind::Happy,
        label: h
            .summary
            .clone()
            .unwrap_or_else(|| HAPPY_PATH_LABEL.to_string()),
        expectation: Expectation {
            status: Some(h.expected_status),
            error_body: None,
        },
        override_request: None,
    });

    let sad = case.sad_paths.iter().map(|s| Scenario {
        kind: ScenarioKind::Sad,
        label: s
            .scenario
            .clone()
            .unwrap_or_else(|| SAD_PATH_LABEL.to_string()),
        expectation: Expectation {
            status: s.expected_status,
            error_body: s.expected_error_body.clone(),
        },
        override_request: s.override_request.clone(),
    });

    happy.chain(sad).collect()
}

/// Fully materialized request for one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRequest {
    pub method: Method,
    /// Base URL + route + encoded query string
    pub url: String,
    /// In send order; later entries already replaced same-named earlier ones
    pub headers: Vec<(String, String)>,
    /// `None` when the chosen body is falsy
    pub body: Option<Value>,
}

/// Builds [`ScenarioRequest`]s against one API host.
#[derive(Debug, Clone)]
pub struct RequestSynthesizer {
    base_url: String,
    default_headers: BTreeMap<String, String>,
}

impl RequestSynthesizer {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_url.clone()).with_default_headers(config.headers.clone())
    }

    #[must_use]
    pub fn with_default_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.default_headers = headers;
        self
    }

    /// Materialize the request for `scenario`.
    ///
    /// Each of headers, body and query comes from the scenario override when
    /// it defines that field, otherwise from the case's sample request.
    /// Returns `None` for skipped cases.
    #[must_use]
    pub fn synthesize(&self, case: &TestCase, scenario: &Scenario) -> Option<ScenarioRequest> {
        let method = case.method?;
        let sample = &case.sample_request;
        let ov = scenario.override_request.as_ref();

        let headers = ov
            .and_then(|o| o.headers.as_ref())
            .unwrap_or(&sample.headers);
        let body = ov.and_then(|o| o.body.as_ref()).unwrap_or(&sample.body);
        let query = ov.and_then(|o| o.query.as_ref()).unwrap_or(&sample.query);

        Some(ScenarioRequest {
            method,
            url: build_url(&self.base_url, &case.route, query),
            headers: self.merge_headers(headers),
            body: (!is_falsy(body)).then(|| body.clone()),
        })
    }

    fn merge_headers(&self, request_headers: &Map<String, Value>) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = self
            .default_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, value) in request_headers {
            merged.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            merged.push((name.clone(), value_to_param_string(value)));
        }
        merged
    }
}

/// `base` + `route` + `?query`, joined with exactly one `/`.
#[must_use]
pub fn build_url(base: &str, route: &str, query: &Map<String, Value>) -> String {
    let base = base.trim_end_matches('/');
    let mut url = if route.is_empty() {
        base.to_string()
    } else if route.starts_with('/') {
        format!("{base}{route}")
    } else {
        format!("{base}/{route}")
    };

    if let Some(qs) = query_string(query) {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&qs);
    }
    url
}

/// `key=value` pairs joined by `&`, in fixture order.
///
/// Keys with a falsy value (null, false, 0, "", [], {}) are left out entirely.
/// Returns `None` when nothing remains.
#[must_use]
pub fn query_string(query: &Map<String, Value>) -> Option<String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in query {
        if is_falsy(value) {
            continue;
        }
        serializer.append_pair(key, &value_to_param_string(value));
        any = true;
    }
    any.then(|| serializer.finish())
}

/// Whether a fixture value counts as "not provided".
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Strings verbatim, everything else as JSON text.
#[must_use]
pub fn value_to_param_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
