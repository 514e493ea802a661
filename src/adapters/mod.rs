// Adapters layer: concrete implementations of the domain ports for the
// external services (Gemini, Tavily, FASHN), image hosts and local storage.

pub mod fashn;
pub mod gemini;
pub mod images;
pub mod storage;
pub mod tavily;

use crate::utils::error::Result;
use reqwest::Client;
use std::time::Duration;

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .build()?)
}

/// Shortens provider error bodies before they end up in logs or error messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 300;
    if body.chars().count() <= LIMIT {
        return body.to_string();
    }
    let head: String = body.chars().take(LIMIT).collect();
    format!("{}...", head)
}
