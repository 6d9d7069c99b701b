use axum::http::HeaderMap;

use crate::config::AppConfig;

/// Absolute base URL for links in responses, without a trailing slash.
///
/// A configured `server.public_url` wins; otherwise the URL is derived from
/// the request's Host header (honouring `X-Forwarded-Proto` behind a
/// reverse proxy), falling back to the bind address.
pub fn base_url(config: &AppConfig, headers: &HeaderMap) -> String {
    let configured = config.server.public_url.trim();
    if !configured.is_empty() {
        return configured.trim_end_matches('/').to_string();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    match headers.get(axum::http::header::HOST).and_then(|v| v.to_str().ok()) {
        Some(host) => format!("{scheme}://{host}"),
        None => format!(
            "{scheme}://{}:{}",
            config.server.host, config.server.port
        ),
    }
}
