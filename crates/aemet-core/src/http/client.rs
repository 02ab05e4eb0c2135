//! libcurl-backed transport.

use std::str;
use std::time::Duration;

use super::parse::parse_header_line;
use super::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::control::CancelToken;

/// Blocking curl GET. A fresh `Easy` handle per request keeps the transport
/// `Sync` so one instance can be shared by every station worker.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    user_agent: String,
    connect_timeout: Duration,
}

impl CurlTransport {
    pub fn new(user_agent: impl Into<String>) -> Self {
        CurlTransport {
            user_agent: user_agent.into(),
            connect_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn perform(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<HttpResponse, curl::Error> {
        let mut headers: Vec<(String, String)> = Vec::new();
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&request.url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.user_agent)?;
        easy.connect_timeout(self.connect_timeout.min(request.timeout))?;
        easy.timeout(request.timeout)?;
        easy.progress(true)?;

        let mut list = curl::easy::List::new();
        for (k, v) in &request.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if !request.headers.is_empty() {
            easy.http_headers(list)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    // A new status line starts the headers of the next hop.
                    if line.starts_with("HTTP/") {
                        headers.clear();
                    } else if let Some(pair) = parse_header_line(line) {
                        headers.push(pair);
                    }
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        Ok(HttpResponse {
            status: u16::try_from(status).unwrap_or(0),
            headers,
            body,
        })
    }
}

impl Transport for CurlTransport {
    fn get(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<HttpResponse, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Aborted);
        }
        self.perform(request, cancel).map_err(|e| {
            if cancel.is_cancelled() {
                TransportError::Aborted
            } else {
                from_curl(&e)
            }
        })
    }
}

fn from_curl(e: &curl::Error) -> TransportError {
    let msg = e.to_string();
    if e.is_aborted_by_callback() {
        TransportError::Aborted
    } else if e.is_operation_timedout() {
        TransportError::Timeout(msg)
    } else if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_send_error()
        || e.is_recv_error()
        || e.is_got_nothing()
        || e.is_partial_file()
        || e.is_ssl_connect_error()
    {
        TransportError::Connection(msg)
    } else {
        TransportError::Other(msg)
    }
}
