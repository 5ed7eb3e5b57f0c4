//! Fixture documents: loading and shape normalization
//!
//! A fixture document is an array of case objects, each describing one endpoint
//! contract. Two historical layouts are accepted and resolved once, at load time,
//! into a single [`TestCase`]:
//!
//! ```json
//! [
//!   { "httpVerb": "POST", "route": "/orders",
//!     "sampleRequest": { "headers": {}, "body": {"qty": 1} },
//!     "happyPathTest": { "expectedStatusCode": 201 } },
//!   { "sampleRequest": { "method": "GET", "url": "/flights", "query": {"from": "DEL"} },
//!     "happyPathTests": [ { "summary": "one-way", "expectedStatusCode": 200 } ],
//!     "sadPathTests": [ { "scenario": "missing origin",
//!                         "badRequest": { "query": {"from": ""} },
//!                         "expectedErrorResponse": { "statusCode": 400, "errors": ["from required"] } } ] }
//! ]
//! ```

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// HTTP verbs a fixture may use. Anything else excludes the case from the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Parse a fixture verb. Matching is exact: `"get"` is not recognized.
    #[must_use]
    pub fn from_fixture(verb: &str) -> Option<Self> {
        match verb {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which historical layout a case was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FixtureShape {
    /// `httpVerb` / `route` at top level, `sampleRequest` holds headers/body/query only
    Legacy,
    /// `sampleRequest.method` / `sampleRequest.url` carry method and route
    Modern,
}

/// Default request data for a case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTemplate {
    pub headers: Map<String, Value>,
    pub body: Value,
    pub query: Map<String, Value>,
}

/// Partial request used by a sad path. `None` fields fall back to the case template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOverride {
    pub headers: Option<Map<String, Value>>,
    pub body: Option<Value>,
    pub query: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HappyPathExpectation {
    pub summary: Option<String>,
    pub expected_status: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SadPathExpectation {
    pub scenario: Option<String>,
    pub override_request: Option<RequestOverride>,
    /// Missing when the fixture omits it; such a scenario can never pass.
    pub expected_status: Option<u16>,
    /// Expected error response object; its `errors` member is compared.
    pub expected_error_body: Option<Value>,
}

/// Where a case came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSource {
    pub file: PathBuf,
    /// Zero-based position within the file
    pub index: usize,
}

/// One endpoint contract, normalized from either fixture shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub source: CaseSource,
    pub shape: FixtureShape,
    /// `None` when the declared verb is missing or unrecognized; the case is skipped.
    pub method: Option<Method>,
    /// Verb text as written, kept for diagnostics
    pub declared_method: Option<String>,
    /// Empty only for skipped cases
    pub route: String,
    pub sample_request: RequestTemplate,
    /// Only populated when the case carries a `sampleRequest`
    pub happy_paths: Vec<HappyPathExpectation>,
    pub sad_paths: Vec<SadPathExpectation>,
}

impl TestCase {
    /// Operation label, e.g. `"GET /flights"`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let verb = self
            .method
            .map(Method::as_str)
            .or(self.declared_method.as_deref())
            .unwrap_or("?");
        format!("{verb} {}", self.route)
    }

    /// Why this case is excluded from the run, if it is.
    #[must_use]
    pub fn skip_reason(&self) -> Option<String> {
        if self.method.is_some() {
            return None;
        }
        Some(match &self.declared_method {
            Some(verb) => format!("unrecognized method '{verb}'"),
            None => "no method declared".to_string(),
        })
    }
}

// ── Raw document layout ──

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCase {
    http_verb: Option<Value>,
    route: Option<Value>,
    sample_request: Option<RawRequest>,
    happy_path_test: Option<RawHappy>,
    happy_path_tests: Option<Vec<RawHappy>>,
    sad_path_tests: Option<Vec<RawSad>>,
}

#[derive(Deserialize)]
struct RawRequest {
    method: Option<Value>,
    url: Option<Value>,
    headers: Option<Map<String, Value>>,
    body: Option<Value>,
    query: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHappy {
    summary: Option<String>,
    expected_status_code: Option<u16>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSad {
    scenario: Option<String>,
    bad_request: Option<RawRequest>,
    override_request: Option<RawRequest>,
    sample_request: Option<RawRequest>,
    expected_error_response: Option<Map<String, Value>>,
    expected_error_body: Option<Map<String, Value>>,
    expected_status_code: Option<u16>,
}

impl RawRequest {
    fn into_template(self) -> RequestTemplate {
        RequestTemplate {
            headers: self.headers.unwrap_or_default(),
            body: self.body.unwrap_or_else(|| Value::Object(Map::new())),
            query: self.query.unwrap_or_default(),
        }
    }

    fn into_override(self) -> RequestOverride {
        RequestOverride {
            headers: self.headers,
            body: self.body,
            query: self.query,
        }
    }

    fn is_empty(&self) -> bool {
        self.method.is_none()
            && self.url.is_none()
            && self.headers.is_none()
            && self.body.is_none()
            && self.query.is_none()
    }
}

/// Shape detected before normalization.
enum DetectedShape {
    Legacy { verb: String, route: Option<String> },
    Modern,
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn detect_shape(raw: &RawCase) -> DetectedShape {
    match non_empty_str(raw.http_verb.as_ref()) {
        Some(verb) => DetectedShape::Legacy {
            verb,
            route: non_empty_str(raw.route.as_ref()),
        },
        None => DetectedShape::Modern,
    }
}

fn normalize(raw: RawCase, source: CaseSource) -> Result<TestCase, FixtureError> {
    let embedded_method = raw
        .sample_request
        .as_ref()
        .and_then(|r| non_empty_str(r.method.as_ref()));
    let embedded_route = raw
        .sample_request
        .as_ref()
        .and_then(|r| non_empty_str(r.url.as_ref()));

    let (shape, declared_method, route) = match detect_shape(&raw) {
        DetectedShape::Legacy { verb, route } => {
            (FixtureShape::Legacy, Some(verb), route.or(embedded_route))
        }
        DetectedShape::Modern => {
            let route = embedded_route.or_else(|| non_empty_str(raw.route.as_ref()));
            (FixtureShape::Modern, embedded_method, route)
        }
    };

    let Some(method) = declared_method.as_deref().and_then(Method::from_fixture) else {
        return Ok(skipped_case(shape, declared_method, route, source));
    };
    let has_sample = raw.sample_request.is_some();
    let sample_request = raw
        .sample_request
        .map(RawRequest::into_template)
        .unwrap_or_default();

    let route = route.ok_or_else(|| FixtureError::Case {
        path: source.file.clone(),
        index: source.index,
        message: format!("{method} case has neither 'route' nor 'sampleRequest.url'"),
    })?;

    let raw_happy: Vec<RawHappy> = match (raw.happy_path_test, raw.happy_path_tests) {
        (Some(single), _) => vec![single],
        (None, Some(list)) => list,
        (None, None) => Vec::new(),
    };

    let mut happy_paths = Vec::new();
    if has_sample {
        for (i, happy) in raw_happy.into_iter().enumerate() {
            let expected_status = happy.expected_status_code.ok_or_else(|| FixtureError::Case {
                path: source.file.clone(),
                index: source.index,
                message: format!("happy path #{i} has no 'expectedStatusCode'"),
            })?;
            happy_paths.push(HappyPathExpectation {
                summary: happy.summary,
                expected_status,
            });
        }
    }

    let sad_paths = raw
        .sad_path_tests
        .unwrap_or_default()
        .into_iter()
        .map(normalize_sad)
        .collect();

    Ok(TestCase {
        source,
        shape,
        method: Some(method),
        declared_method,
        route,
        sample_request,
        happy_paths,
        sad_paths,
    })
}

/// Shape, declared verb and route of a case, read without validating the rest.
fn peek_case(item: &Value) -> (FixtureShape, Option<String>, Option<String>) {
    let sample = item.get("sampleRequest");
    let embedded_route = || non_empty_str(sample.and_then(|r| r.get("url")));
    let top_route = || non_empty_str(item.get("route"));
    match non_empty_str(item.get("httpVerb")) {
        Some(verb) => (
            FixtureShape::Legacy,
            Some(verb),
            top_route().or_else(embedded_route),
        ),
        None => (
            FixtureShape::Modern,
            non_empty_str(sample.and_then(|r| r.get("method"))),
            embedded_route().or_else(top_route),
        ),
    }
}

/// Skipped cases carry no scenarios and are never validated past the verb.
fn skipped_case(
    shape: FixtureShape,
    declared_method: Option<String>,
    route: Option<String>,
    source: CaseSource,
) -> TestCase {
    TestCase {
        source,
        shape,
        method: None,
        declared_method,
        route: route.unwrap_or_default(),
        sample_request: RequestTemplate::default(),
        happy_paths: Vec::new(),
        sad_paths: Vec::new(),
    }
}

fn normalize_sad(raw: RawSad) -> SadPathExpectation {
    let override_request = [raw.bad_request, raw.override_request, raw.sample_request]
        .into_iter()
        .flatten()
        .find(|r| !r.is_empty())
        .map(RawRequest::into_override);

    let expected_status = raw
        .expected_error_response
        .as_ref()
        .and_then(|e| e.get("statusCode"))
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .or(raw.expected_status_code);

    let expected_error_body = [raw.expected_error_response, raw.expected_error_body]
        .into_iter()
        .flatten()
        .find(|body| !body.is_empty())
        .map(Value::Object);

    SadPathExpectation {
        scenario: raw.scenario,
        override_request,
        expected_status,
        expected_error_body,
    }
}

// ── Loading ──

/// Parse one fixture document.
///
/// Format is chosen by extension (`.json`, `.yaml`/`.yml`), otherwise sniffed
/// from the first non-blank character.
///
/// # Errors
///
/// Returns error if the document is not valid JSON/YAML, is not an array of
/// objects, or a case is structurally unusable.
pub fn parse_fixture(path: &Path, content: &str) -> Result<Vec<TestCase>, FixtureError> {
    let document = parse_document(path, content)?;
    let Value::Array(items) = document else {
        return Err(FixtureError::Parse(
            path.to_path_buf(),
            "expected an array of test cases".into(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(FixtureError::Case {
                    path: path.to_path_buf(),
                    index,
                    message: "test case must be an object".into(),
                });
            }
            let source = CaseSource {
                file: path.to_path_buf(),
                index,
            };
            let (shape, declared_method, route) = peek_case(&item);
            if !declared_method.as_deref().is_some_and(|v| Method::from_fixture(v).is_some()) {
                return Ok(skipped_case(shape, declared_method, route, source));
            }
            let raw: RawCase = serde_json::from_value(item).map_err(|e| FixtureError::Case {
                path: path.to_path_buf(),
                index,
                message: e.to_string(),
            })?;
            normalize(raw, source)
        })
        .collect()
}

/// Load fixture files in order. The first failure aborts the whole load.
///
/// # Errors
///
/// Returns error if any file cannot be read or parsed.
pub fn load_fixtures(paths: &[PathBuf]) -> Result<Vec<TestCase>, FixtureError> {
    let mut cases = Vec::new();
    for path in paths {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FixtureError::Io(path.clone(), e.to_string()))?;
        cases.extend(parse_fixture(path, &content)?);
    }
    Ok(cases)
}

fn parse_document(path: &Path, content: &str) -> Result<Value, FixtureError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let as_json = |content: &str| {
        serde_json::from_str::<Value>(content)
            .map_err(|e| FixtureError::Parse(path.to_path_buf(), format!("Invalid JSON: {e}")))
    };
    let as_yaml = |content: &str| {
        serde_yml::from_str::<Value>(content)
            .map_err(|e| FixtureError::Parse(path.to_path_buf(), format!("Invalid YAML: {e}")))
    };

    match ext.as_str() {
        "json" => as_json(content),
        "yaml" | "yml" => as_yaml(content),
        _ => {
            let trimmed = content.trim_start();
            if trimmed.starts_with('[') || trimmed.starts_with('{') {
                as_json(content)
            } else {
                as_yaml(content)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Cannot read fixture {0}: {1}")]
    Io(PathBuf, String),
    #[error("Invalid fixture {0}: {1}")]
    Parse(PathBuf, String),
    #[error("Invalid fixture {path}, case #{index}: {message}")]
    Case {
        path: PathBuf,
        index: usize,
        message: String,
    },
}
