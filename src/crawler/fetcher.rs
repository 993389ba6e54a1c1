//! HTTP fetching
//!
//! One client per crawl job, one [`fetch`] call per frontier request. Fetch
//! failures are classified so the engine can log and count them; they never
//! abort the job.

use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A fetched page
#[derive(Debug)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value (empty if absent)
    pub content_type: String,

    /// Response headers (lowercase names; non-UTF-8 values are dropped)
    pub headers: HashMap<String, String>,

    /// Response body
    pub body: String,
}

impl FetchResponse {
    /// Returns true if the body should be parsed as HTML
    ///
    /// Servers that omit the Content-Type header are assumed to serve HTML.
    pub fn is_html(&self) -> bool {
        self.content_type.is_empty()
            || self.content_type.contains("text/html")
            || self.content_type.contains("application/xhtml")
    }
}

/// Per-page transport failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read body for {url}: {message}")]
    Body { url: String, message: String },

    #[error("transport error for {url}: {message}")]
    Other { url: String, message: String },
}

/// Builds the HTTP client used for a crawl job
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a single URL
///
/// # Returns
///
/// * `Ok(FetchResponse)` - a 2xx response with its body read
/// * `Err(FetchError)` - the failure, classified for logging
pub async fn fetch(client: &Client, url: &Url) -> Result<FetchResponse, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| classify_send_error(url, e))?;

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut headers = HashMap::new();
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_string(), value.to_string());
        }
    }

    let content_type = headers.get("content-type").cloned().unwrap_or_default();

    let body = response.text().await.map_err(|e| FetchError::Body {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    Ok(FetchResponse {
        final_url,
        status: status.as_u16(),
        content_type,
        headers,
        body,
    })
}

fn classify_send_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Other {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
