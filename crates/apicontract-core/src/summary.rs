//! Run-wide counts and per-endpoint status distribution

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fixture::TestCase;
use crate::result::{ScenarioResult, StatusCode};

/// Per-endpoint statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStats {
    /// Operation label, e.g. "POST /orders"
    pub endpoint: String,
    pub total: u64,
    pub passed: u64,
    /// Status ("200", "N/A", ...) → count
    pub status_distribution: BTreeMap<String, u64>,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Cases loaded from the fixtures, skipped ones included
    pub total_cases: u64,
    /// Cases without a recognized method
    pub skipped_cases: u64,
    pub total_scenarios: u64,
    pub passed: u64,
    pub failed: u64,
    /// Scenarios that got no HTTP response at all
    pub no_response: u64,
    /// In the order endpoints first appear
    pub endpoints: Vec<EndpointStats>,
}

impl RunSummary {
    #[must_use]
    pub fn compute(cases: &[TestCase], results: &[ScenarioResult]) -> Self {
        let mut endpoints: Vec<EndpointStats> = Vec::new();
        let mut passed = 0;
        let mut no_response = 0;

        for r in results {
            if r.passed {
                passed += 1;
            }
            if r.status_code == StatusCode::NoResponse {
                no_response += 1;
            }

            let idx = match endpoints.iter().position(|e| e.endpoint == r.endpoint) {
                Some(i) => i,
                None => {
                    endpoints.push(EndpointStats {
                        endpoint: r.endpoint.clone(),
                        total: 0,
                        passed: 0,
                        status_distribution: BTreeMap::new(),
                    });
                    endpoints.len() - 1
                }
            };
            let stats = &mut endpoints[idx];
            stats.total += 1;
            if r.passed {
                stats.passed += 1;
            }
            *stats
                .status_distribution
                .entry(r.status_code.to_string())
                .or_default() += 1;
        }

        let total_scenarios = results.len() as u64;
        Self {
            total_cases: cases.len() as u64,
            skipped_cases: cases.iter().filter(|c| c.method.is_none()).count() as u64,
            total_scenarios,
            passed,
            failed: total_scenarios - passed,
            no_response,
            endpoints,
        }
    }

    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Format a status distribution as "200x3, 400x1, N/Ax1".
#[must_use]
pub fn format_distribution(dist: &BTreeMap<String, u64>) -> String {
    dist.iter()
        .map(|(status, count)| format!("{status}x{count}"))
        .collect::<Vec<_>>()
        .join(", ")
}
