//! Debug rendering of requests as curl commands.

use bytes::Bytes;
use http::header::COOKIE;

use crate::{Request, ResponseHead};

/// Render `request` as an equivalent curl invocation.
///
/// Cookies are passed with `-b` rather than as a header.
pub fn curl_command(request: &Request) -> String {
    let mut components = vec!["$ curl -v".to_string(), format!("-X {}", request.method())];

    let cookies: Vec<&str> = request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if !cookies.is_empty() {
        components.push(format!("-b \"{}\"", cookies.join(";")));
    }

    for (name, value) in request.headers() {
        if name == COOKIE {
            continue;
        }
        let value = String::from_utf8_lossy(value.as_bytes()).replace('"', "\\\"");
        components.push(format!("-H \"{name}: {value}\""));
    }

    if let Some(body) = request.body() {
        let body = String::from_utf8_lossy(body)
            .replace("\\\"", "\\\\\"")
            .replace('"', "\\\"");
        components.push(format!("-d \"{body}\""));
    }

    components.push(format!("\"{}\"", request.url()));
    components.join(" \\\n\t")
}

/// Pretty-print a response body, falling back to lossy text.
pub fn pretty_body(data: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(data)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(data).into_owned())
}

/// Emit the curl reconstruction and response summary of one attempt.
pub(crate) fn log_exchange(
    request: &Request,
    response: Option<&ResponseHead>,
    data: Option<&Bytes>,
) {
    tracing::info!(target: "courier_http::curl", "{}", curl_command(request));

    let status = response.map(|r| r.status().as_u16()).unwrap_or(0);
    match data.filter(|d| !d.is_empty()) {
        Some(data) => tracing::info!(
            target: "courier_http::curl",
            status,
            "Response body:\n{}",
            pretty_body(data)
        ),
        None => tracing::info!(target: "courier_http::curl", status, "Response without body"),
    }
}
