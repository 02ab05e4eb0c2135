//! Test doubles for the transport and the sleeper.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::control::{CancelToken, Cancelled, Sleeper};
use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};

pub(crate) type Reply = Result<HttpResponse, TransportError>;

pub(crate) fn reply(status: u16, body: &str) -> Reply {
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body: body.as_bytes().to_vec(),
    })
}

pub(crate) fn reply_with_header(status: u16, name: &str, value: &str, body: &str) -> Reply {
    Ok(HttpResponse {
        status,
        headers: vec![(name.to_string(), value.to_string())],
        body: body.as_bytes().to_vec(),
    })
}

/// Index document pointing at `url`.
pub(crate) fn index_ok(url: &str) -> Reply {
    reply(
        200,
        &format!(r#"{{"descripcion":"exito","estado":200,"datos":"{url}","metadatos":"{url}/meta"}}"#),
    )
}

pub(crate) fn index_not_found() -> Reply {
    reply(
        404,
        r#"{"descripcion":"No hay datos que satisfagan esos criterios","estado":404}"#,
    )
}

struct Route {
    pattern: String,
    replies: VecDeque<Reply>,
}

/// Replays canned replies per URL substring. The last reply of a route
/// repeats forever. Every request is recorded.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(self, pattern: &str, replies: Vec<Reply>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push(Route {
                pattern: pattern.to_string(),
                replies: replies.into(),
            });
        self
    }

    pub(crate) fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count_matching(&self, pattern: &str) -> usize {
        self.calls()
            .iter()
            .filter(|r| r.url.contains(pattern))
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn get(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());
        if cancel.is_cancelled() {
            return Err(TransportError::Aborted);
        }
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|r| request.url.contains(&r.pattern))
            .ok_or_else(|| TransportError::Other(format!("no route for {}", request.url)))?;
        if route.replies.len() > 1 {
            route
                .replies
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("exhausted".into())))
        } else {
            route
                .replies
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Other("exhausted".into())))
        }
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub(crate) struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
    cancelled: bool,
}

impl RecordingSleeper {
    /// A sleeper whose every wait reports cancellation.
    pub(crate) fn cancelled() -> Self {
        RecordingSleeper {
            delays: Mutex::new(Vec::new()),
            cancelled: true,
        }
    }

    pub(crate) fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) -> Result<(), Cancelled> {
        self.delays.lock().unwrap().push(delay);
        if self.cancelled {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
