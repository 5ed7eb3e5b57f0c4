//! `.http` reproduction file for failed scenarios
//!
//! Only scenarios that failed and carry a request snapshot are written.
//! Headers come from the snapshot, so sensitive values stay masked.

use crate::result::ScenarioResult;

/// Render every reproducible failure as one `.http` document.
#[must_use]
pub fn to_http_file(results: &[ScenarioResult]) -> String {
    let failures: Vec<&ScenarioResult> = results
        .iter()
        .filter(|r| !r.passed && r.has_snapshot())
        .collect();

    let mut lines = Vec::new();
    lines.push(format!(
        "# Failed contract scenarios ({} requests)",
        failures.len()
    ));
    lines.push(String::new());

    for (idx, r) in failures.iter().enumerate() {
        lines.push(format!("### [{idx}] {} - {}", r.endpoint, r.scenario));
        lines.push(format!(
            "# Status: {} (expected {})",
            r.status_code,
            r.expected_status_code
                .map_or_else(|| "none".to_string(), |s| s.to_string())
        ));
        for error in &r.errors {
            lines.push(format!("# {error}"));
        }
        lines.push(request_to_http(r));
        lines.push(String::new());
        lines.push("###".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Request line, headers and body of a single result.
#[must_use]
pub fn request_to_http(result: &ScenarioResult) -> String {
    let mut lines = vec![format!("{} {}", result.method, result.url)];

    let mut has_content_type = false;
    if let Some(headers) = &result.request_headers {
        for (key, value) in headers {
            if matches!(key.to_lowercase().as_str(), "host" | "content-length") {
                continue;
            }
            has_content_type |= key.eq_ignore_ascii_case("content-type");
            let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            lines.push(format!("{key}: {value}"));
        }
    }

    if let Some(body) = &result.request_body {
        if !has_content_type {
            lines.push("Content-Type: application/json".to_string());
        }
        lines.push(String::new());
        lines.push(body.clone());
    }

    lines.join("\n")
}
