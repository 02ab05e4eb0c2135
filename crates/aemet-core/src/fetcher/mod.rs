//! Two-stage fetch of one chunk: index request for a `datos` pointer, then
//! the payload behind it. Each stage runs its own retry loop under the same
//! policy. Nothing here touches the disk.

mod data;
mod index;
mod lenient;
mod parse;

pub use lenient::parse_dump;

use std::time::Duration;

use crate::control::{CancelToken, Cancelled, Sleeper};
use crate::credential::ApiKey;
use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::outcome::{ChunkOutcome, Record, Stage};
use crate::planner::Chunk;
use crate::retry::{
    classify_transport, run_with_retry, Failure, FailureKind, Resolved, RetryPolicy, StageError,
};

/// Endpoint and timeouts for both stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub api_base: String,
    pub index_timeout: Duration,
    pub data_timeout: Duration,
}

pub struct TwoStageFetcher<T> {
    transport: T,
    api_key: ApiKey,
    settings: FetchSettings,
    policy: RetryPolicy,
}

impl<T: Transport> TwoStageFetcher<T> {
    pub fn new(transport: T, api_key: ApiKey, settings: FetchSettings, policy: RetryPolicy) -> Self {
        TwoStageFetcher {
            transport,
            api_key,
            settings,
            policy,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn index_url(&self, station: &str, chunk: &Chunk) -> String {
        index::index_url(&self.settings.api_base, station, chunk)
    }

    /// Resolve one chunk. `Fatal` is returned as an outcome; only
    /// cancellation is an error.
    pub fn fetch(
        &self,
        station: &str,
        chunk: &Chunk,
        sleeper: &dyn Sleeper,
        cancel: &CancelToken,
    ) -> Result<ChunkOutcome, Cancelled> {
        let url = self.index_url(station, chunk);
        let pointer = match run_with_retry(&self.policy, Stage::Index, sleeper, |attempt| {
            self.index_attempt(&url, attempt, cancel)
        }) {
            Ok(Resolved::Value(pointer)) => pointer,
            Ok(Resolved::Empty) => return Ok(ChunkOutcome::EmptyConfirmed),
            Err(StageError::Fatal(reason)) => return Ok(ChunkOutcome::Fatal(reason)),
            Err(StageError::Cancelled) => return Err(Cancelled),
        };

        match run_with_retry(&self.policy, Stage::Data, sleeper, |attempt| {
            self.data_attempt(&pointer, attempt, cancel)
        }) {
            Ok(Resolved::Value(records)) => Ok(ChunkOutcome::Fetched(records)),
            Ok(Resolved::Empty) => Ok(ChunkOutcome::EmptyConfirmed),
            Err(StageError::Fatal(reason)) => Ok(ChunkOutcome::Fatal(reason)),
            Err(StageError::Cancelled) => Err(Cancelled),
        }
    }

    fn index_attempt(
        &self,
        url: &str,
        attempt: u32,
        cancel: &CancelToken,
    ) -> Result<Result<String, Failure>, Cancelled> {
        tracing::debug!(url, attempt, "index request");
        let request = HttpRequest::get(url, self.settings.index_timeout)
            .header("Accept", "application/json")
            .header("api_key", self.api_key.expose());
        let first = match self.send(&request, cancel)? {
            Ok(resp) => index::judge_index(&resp),
            Err(failure) => return Ok(Err(failure)),
        };
        match first {
            Err(failure) if index::wants_query_fallback(failure.kind) => {
                tracing::debug!(attempt, failure = %failure, "retrying index with query credential");
                let request = match self.query_credential_request(url) {
                    Ok(request) => request,
                    Err(failure) => return Ok(Err(failure)),
                };
                Ok(self.send(&request, cancel)?.and_then(|resp| index::judge_index(&resp)))
            }
            other => Ok(other),
        }
    }

    fn data_attempt(
        &self,
        pointer: &str,
        attempt: u32,
        cancel: &CancelToken,
    ) -> Result<Result<Vec<Record>, Failure>, Cancelled> {
        tracing::debug!(attempt, "data request");
        let request = HttpRequest::get(pointer, self.settings.data_timeout)
            .header("Accept", "application/json");
        Ok(self.send(&request, cancel)?.and_then(|resp| data::judge_data(&resp)))
    }

    fn query_credential_request(&self, url: &str) -> Result<HttpRequest, Failure> {
        let mut parsed = url::Url::parse(url)
            .map_err(|e| Failure::new(FailureKind::Other, format!("invalid index URL: {e}")))?;
        parsed
            .query_pairs_mut()
            .append_pair("api_key", self.api_key.expose());
        Ok(HttpRequest::get(parsed.as_str(), self.settings.index_timeout)
            .header("Accept", "application/json"))
    }

    fn send(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<Result<HttpResponse, Failure>, Cancelled> {
        cancel.check()?;
        match self.transport.get(request, cancel) {
            Ok(resp) => Ok(Ok(resp)),
            Err(TransportError::Aborted) => Err(Cancelled),
            Err(e) => Ok(Err(Failure::new(classify_transport(&e), e.to_string()))),
        }
    }
}
