//! Domain scope handling
//!
//! This module provides base-URL validation, host extraction, the in-scope
//! test applied to every discovered link, and URL normalization for the
//! visited set.

mod normalize;

pub use normalize::normalize_url;

use crate::UrlError;
use url::Url;

/// Validates a base URL and extracts its host
///
/// Fails unless the URL parses and its scheme is http or https.
///
/// # Arguments
///
/// * `raw` - The base URL string from configuration
///
/// # Returns
///
/// * `Ok((Url, String))` - The parsed URL and its lowercase host
/// * `Err(UrlError)` - The URL is malformed, has a bad scheme, or no host
pub fn validate_base_url(raw: &str) -> Result<(Url, String), UrlError> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = extract_host(&url).ok_or(UrlError::MissingHost)?;
    Ok((url, host))
}

/// Extracts the lowercase host from a URL
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a candidate URL is on the allowed host
///
/// The test is exact host equality; subdomains of the allowed host are out of
/// scope. Ports are not part of the comparison, so `example.com:8080` and
/// `example.com` are the same host.
pub fn is_in_scope(candidate: &Url, allowed_host: &str) -> bool {
    match extract_host(candidate) {
        Some(host) => host == allowed_host,
        None => false,
    }
}
