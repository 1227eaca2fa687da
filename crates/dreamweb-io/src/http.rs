//! Non-blocking HTTP: one worker thread per request, results collected by
//! [`HttpService::poll`] on the caller's thread.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::CancellationToken;

/// Cookie/credential policy for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

impl Credentials {
    /// Parse the wire names `omit`, `same-origin` and `include`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "omit" => Some(Credentials::Omit),
            "same-origin" => Some(Credentials::SameOrigin),
            "include" => Some(Credentials::Include),
            _ => None,
        }
    }
}

/// A fully prepared outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Upper-case method name.
    pub method: String,
    pub url: String,
    /// Headers in the order they should be sent.
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub credentials: Credentials,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A settled response. Non-2xx statuses are still responses here; callers
/// decide whether they count as failures.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Reason phrase, e.g. `Not Found`.
    pub reason: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP status level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("The operation was aborted.")]
    Aborted,

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("blocked: unsupported scheme {0}")]
    UnsupportedScheme(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request worker disconnected")]
    Disconnected,
}

impl TransportError {
    /// Short error class reported to callbacks alongside the message.
    pub fn name(&self) -> &'static str {
        match self {
            TransportError::Aborted => "AbortError",
            TransportError::Timeout(_) => "TimeoutError",
            TransportError::InvalidRequest(_) | TransportError::UnsupportedScheme(_) => {
                "TypeError"
            }
            TransportError::Network(_) | TransportError::Disconnected => "NetworkError",
        }
    }
}

/// Executes a single request synchronously. Called on a worker thread.
pub trait HttpTransport: Send + Sync + 'static {
    fn execute(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError>;
}

/// Default transport backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(user_agent.to_string());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Aborted);
        }
        let url = Url::parse(&request.url)
            .map_err(|err| TransportError::InvalidRequest(format!("{}: {err}", request.url)))?;
        let scheme = url.scheme().to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(TransportError::UnsupportedScheme(scheme));
        }
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;

        let mut req = self.client.request(method, url);
        for (name, value) in &request.headers {
            // Omit only withholds ambient cookies; explicit headers still go out.
            if request.credentials == Credentials::Omit && name.eq_ignore_ascii_case("cookie") {
                continue;
            }
            match reqwest::header::HeaderName::from_bytes(name.as_bytes()) {
                Ok(header) => req = req.header(header, value.clone()),
                Err(_) => debug!(header = %name, "skipping invalid header name"),
            }
        }
        if let Some(body) = request.body {
            req = req.body(body);
        }

        let resp = req.send().map_err(map_reqwest_error)?;
        if cancel.is_cancelled() {
            return Err(TransportError::Aborted);
        }
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.bytes().map_err(map_reqwest_error)?.to_vec();
        if cancel.is_cancelled() {
            return Err(TransportError::Aborted);
        }
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            content_type,
            body,
        })
    }
}

/// Result emitted once a request settles.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResult {
    pub request_id: u64,
    pub outcome: Result<HttpResponse, TransportError>,
}

/// Manages non-blocking HTTP requests using a worker thread per request.
pub struct HttpService {
    transport: Arc<dyn HttpTransport>,
    sender: Sender<HttpResult>,
    receiver: Receiver<HttpResult>,
    pending: Vec<(u64, CancellationToken)>,
}

impl HttpService {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            transport,
            sender,
            receiver,
            pending: Vec::new(),
        }
    }

    /// Start `request` on a worker thread. The returned token aborts it.
    pub fn request(&mut self, request_id: u64, request: HttpRequest) -> CancellationToken {
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let transport = Arc::clone(&self.transport);
        let tx = self.sender.clone();
        thread::spawn(move || {
            let outcome = transport.execute(request, &worker_token);
            let _ = tx.send(HttpResult {
                request_id,
                outcome,
            });
        });
        self.pending.push((request_id, token.clone()));
        token
    }

    /// Cancel a request by id: fire its token and drop the pending entry so
    /// any eventual result is ignored.
    pub fn cancel(&mut self, request_id: u64) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(id, token)| {
            if *id == request_id {
                token.cancel();
                false
            } else {
                true
            }
        });
        self.pending.len() != before
    }

    /// Results that are ready now.
    pub fn poll(&mut self) -> Vec<HttpResult> {
        let mut ready = Vec::new();
        while let Ok(result) = self.receiver.try_recv() {
            self.accept(result, &mut ready);
        }
        ready
    }

    /// Block until every pending request has settled or `timeout` elapses.
    pub fn poll_until_idle(&mut self, timeout: Duration) -> Vec<HttpResult> {
        let deadline = Instant::now() + timeout;
        let mut ready = self.poll();
        while self.has_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(result) => self.accept(result, &mut ready),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        ready
    }

    fn accept(&mut self, result: HttpResult, ready: &mut Vec<HttpResult>) {
        let before = self.pending.len();
        self.pending.retain(|(id, _)| *id != result.request_id);
        if self.pending.len() == before {
            debug!(request_id = result.request_id, "dropping result of cancelled request");
            return;
        }
        ready.push(result);
    }

    /// True if there are outstanding requests waiting to complete.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_ids(&self) -> Vec<u64> {
        self.pending.iter().map(|(id, _)| *id).collect()
    }
}
