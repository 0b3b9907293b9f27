//! HTTP client initialization.
//!
//! This module builds the `reqwest` clients shared by the provider adapters.

use std::time::Duration;

use reqwest::ClientBuilder;

/// Initializes a provider HTTP client.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header
/// - Per-request timeout
/// - An optional HTTP(S) proxy for every request
///
/// A proxy URL that cannot be parsed is ignored with a warning.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(
    timeout: Duration,
    user_agent: &str,
    proxy_url: Option<&str>,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = ClientBuilder::new()
        .timeout(timeout)
        .user_agent(user_agent.to_string());

    if let Some(proxy_url) = proxy_url.map(str::trim).filter(|p| !p.is_empty()) {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => {
                log::info!("Using proxy {proxy_url}");
                builder = builder.proxy(proxy);
            }
            Err(e) => log::warn!("Ignoring unparseable proxy URL '{proxy_url}': {e}"),
        }
    }

    builder.build()
}
