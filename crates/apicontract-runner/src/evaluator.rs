//! Contract evaluator: sends one scenario request and judges the response
//!
//! Every outcome becomes a [`ScenarioResult`]. Transport failures (connect
//! refused, DNS, timeout, invalid header) are recorded with status "N/A"
//! instead of being returned as errors.

use std::error::Error as StdError;
use std::time::Duration;

use apicontract_core::evaluate::{ResponseCapture, evaluate};
use apicontract_core::{Config, Method, Scenario, ScenarioRequest, ScenarioResult, Strictness};

use crate::engine::RunnerError;

pub struct ContractEvaluator {
    client: reqwest::blocking::Client,
    strictness: Strictness,
    include_bodies: bool,
}

impl ContractEvaluator {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(timeout: Duration) -> Result<Self, RunnerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RunnerError::Client(error_chain(&e)))?;
        Ok(Self {
            client,
            strictness: Strictness::default(),
            include_bodies: false,
        })
    }

    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn from_config(config: &Config) -> Result<Self, RunnerError> {
        Ok(Self::new(config.timeout())?
            .with_strictness(config.strictness)
            .with_include_bodies(config.include_bodies_on_success))
    }

    #[must_use]
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    #[must_use]
    pub fn with_include_bodies(mut self, include: bool) -> Self {
        self.include_bodies = include;
        self
    }

    /// Send `request` and judge the response against `scenario`.
    #[must_use]
    pub fn evaluate(
        &self,
        endpoint: String,
        scenario: &Scenario,
        request: &ScenarioRequest,
    ) -> ScenarioResult {
        match self.send(request) {
            Ok((status, body_text)) => {
                let response = ResponseCapture {
                    status,
                    body_text: &body_text,
                };
                let evaluation = evaluate(
                    response,
                    &scenario.expectation,
                    scenario.kind,
                    self.strictness,
                );
                ScenarioResult::received(
                    endpoint,
                    scenario,
                    request,
                    response,
                    evaluation,
                    self.include_bodies,
                )
            }
            Err(reason) => ScenarioResult::no_response(endpoint, scenario, request, reason),
        }
    }

    fn send(&self, request: &ScenarioRequest) -> Result<(u16, String), String> {
        let mut req = self
            .client
            .request(http_method(request.method), &request.url);
        // Invalid names/values are kept on the builder and surface from send().
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req.send().map_err(|e| error_chain(&e))?;
        let status = resp.status().as_u16();
        let body_text = resp.text().map_err(|e| error_chain(&e))?;
        Ok((status, body_text))
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Error message followed by every source, joined with ": ".
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
