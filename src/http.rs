use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, StatusCode, header::HeaderValue};

use crate::constants::USER_AGENT;

pub fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed creating HTTP client")
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

pub fn parse_retry_after(value: Option<&HeaderValue>) -> Option<Duration> {
    let value = value?.to_str().ok()?.trim();
    let secs = value.parse::<u64>().ok()?;
    Some(Duration::from_secs(secs))
}

pub fn truncate_for_log(text: &str) -> String {
    let trimmed = text.trim();
    let max_len = 300usize;
    if trimmed.len() <= max_len {
        return trimmed.to_string();
    }
    let mut cut = max_len;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &trimmed[..cut])
}
