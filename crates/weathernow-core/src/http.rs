//! Shared HTTP plumbing for backend clients.
//!
//! The backend reports failures as `{ "error": "..." }` with a non-2xx status.
//! Every client funnels responses through [`decode_json`] or [`expect_success`]
//! so that shape is turned into a typed [`FetchError`] in one place.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::error::{FetchError, ReqwestErrorExt};

const USER_AGENT: &str = concat!("WeatherNow/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Build a client with the configured request timeout.
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Parse and normalize a backend base URL so `join_path` can append segments.
pub fn parse_base_url(base_url: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| FetchError::Validation(format!("Invalid backend URL: {}", e)))?;
    if url.cannot_be_a_base() {
        return Err(FetchError::Validation(format!(
            "Backend URL cannot be a base: {}",
            base_url
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Append path segments to a base URL, percent-encoding each segment.
pub fn join_path(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Turn a non-success response into `FetchError::Backend`, pass success through.
pub async fn expect_success(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                text
            }
        });

    tracing::debug!("Backend returned {}: {}", status, message);
    Err(FetchError::Backend {
        status: status.as_u16(),
        message,
    })
}

/// Check status, then deserialize the JSON body.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let response = expect_success(response).await?;
    response.json::<T>().await.map_err(|e| e.into_fetch_error())
}
