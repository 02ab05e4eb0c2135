//! Blocking HTTP GET used by both fetch stages.
//!
//! The fetcher talks to a `Transport` so tests can script responses; the
//! production implementation is libcurl via the `curl` crate.

mod client;
mod parse;

pub use client::CurlTransport;
pub use parse::{decode_body, parse_header_line};

use std::time::Duration;
use thiserror::Error;

use crate::control::CancelToken;

/// One GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        HttpRequest {
            url: url.into(),
            headers: Vec::new(),
            timeout,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Response of the final hop (redirects are followed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("transfer aborted by cancellation")]
    Aborted,
    #[error("request failed: {0}")]
    Other(String),
}

/// Performs one blocking GET. Implementations must give up promptly once
/// `cancel` fires, returning `TransportError::Aborted`.
pub trait Transport: Send + Sync {
    fn get(&self, request: &HttpRequest, cancel: &CancelToken)
        -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn get(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<HttpResponse, TransportError> {
        (**self).get(request, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let resp = HttpResponse {
            status: 429,
            headers: vec![("Retry-After".into(), "5".into())],
            body: Vec::new(),
        };
        assert_eq!(resp.header("retry-after"), Some("5"));
        assert_eq!(resp.header("etag"), None);
        assert!(!resp.is_success());
    }

    #[test]
    fn request_builder_keeps_header_order() {
        let req = HttpRequest::get("http://x/", Duration::from_secs(1))
            .header("api_key", "k")
            .header("Accept", "application/json");
        assert_eq!(req.headers[0].0, "api_key");
        assert_eq!(req.headers[1].0, "Accept");
    }
}
