//! API request widget.
//!
//! [`ApiClient::fetch`] issues one HTTP call per invocation and returns its
//! [`RequestId`] right away. The call runs on an [`HttpService`] worker;
//! [`ApiClient::poll`] picks up settled calls on the UI context and runs the
//! caller's callbacks there, `on_loading(false)` first and then exactly one
//! of `on_success` / `on_error`. There is no retry.
//!
//! Each call registers a cancellation token in the in-flight map before the
//! request leaves and removes it when the call settles or is cancelled.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dreamweb_dom::{Document, ElementId};
use dreamweb_io::{
    CancellationToken, Credentials, HttpRequest, HttpResponse, HttpService, HttpTransport,
    TransportError,
};
use dreamweb_ir::Node;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::notify::{Notification, NotificationBus};
use crate::style::value_text;

/// Monotonically increasing per client, starting at 1.
pub type RequestId = u64;

/// Parsed response body, chosen by the declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// `application/json`
    Json(Value),
    /// Any `text/*` type.
    Text(String),
    /// Everything else, untouched.
    Blob {
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

/// What `on_error` receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error class, e.g. `Error`, `AbortError`, `NetworkError`.
    pub name: String,
    pub message: String,
    /// HTTP status when the server answered with a non-2xx code.
    pub status: Option<u16>,
}

impl ApiError {
    fn http(response: &HttpResponse) -> Self {
        Self {
            name: "Error".to_string(),
            message: format!("HTTP {}: {}", response.status, response.reason),
            status: Some(response.status),
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        Self {
            name: err.name().to_string(),
            message: err.to_string(),
            status: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

type SuccessCallback = Box<dyn FnMut(&ResponseData)>;
type ErrorCallback = Box<dyn FnMut(&ApiError)>;
type LoadingCallback = Box<dyn FnMut(bool)>;

/// Options for a single call. Built with the chained setters:
///
/// ```ignore
/// let options = FetchOptions::new("/api/items")
///     .method("POST")
///     .body(json!({ "name": "widget" }))
///     .on_success(|data| println!("{data:?}"));
/// ```
pub struct FetchOptions {
    pub url: String,
    /// Defaults to `GET`; upper-cased before sending.
    pub method: String,
    /// Merged over `Content-Type: application/json`; caller entries win.
    pub headers: Vec<(String, String)>,
    /// Strings are sent verbatim, other values as JSON. Never sent with GET
    /// or HEAD.
    pub body: Option<Value>,
    pub credentials: Credentials,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
    on_loading: Option<LoadingCallback>,
}

impl FetchOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
            credentials: Credentials::default(),
            on_success: None,
            on_error: None,
            on_loading: None,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn on_success(mut self, callback: impl FnMut(&ResponseData) + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(&ApiError) + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn on_loading(mut self, callback: impl FnMut(bool) + 'static) -> Self {
        self.on_loading = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// How a call settled.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success {
        request_id: RequestId,
        status: u16,
        data: ResponseData,
    },
    Failure {
        request_id: RequestId,
        error: ApiError,
    },
}

impl FetchOutcome {
    pub fn request_id(&self) -> RequestId {
        match self {
            FetchOutcome::Success { request_id, .. } | FetchOutcome::Failure { request_id, .. } => {
                *request_id
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

struct Handlers {
    url: String,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
    on_loading: Option<LoadingCallback>,
}

/// Outbound HTTP on behalf of `ApiRequest` / `FetchData` nodes and host code.
pub struct ApiClient {
    service: HttpService,
    /// Relative URLs are resolved against this, like a page origin.
    base_url: Option<Url>,
    request_counter: RequestId,
    in_flight: HashMap<RequestId, CancellationToken>,
    handlers: HashMap<RequestId, Handlers>,
    /// Calls that settled without reaching a worker (bad URL, cancellation).
    settled: VecDeque<(RequestId, Result<HttpResponse, TransportError>)>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: Option<Url>) -> Self {
        Self {
            service: HttpService::new(transport),
            base_url,
            request_counter: 0,
            in_flight: HashMap::new(),
            handlers: HashMap::new(),
            settled: VecDeque::new(),
        }
    }

    /// Start a call. `on_loading(true)` runs before this returns.
    pub fn fetch(&mut self, options: FetchOptions) -> RequestId {
        self.request_counter += 1;
        let request_id = self.request_counter;

        let FetchOptions {
            url,
            method,
            headers,
            body,
            credentials,
            on_success,
            on_error,
            mut on_loading,
        } = options;

        if let Some(callback) = on_loading.as_mut() {
            callback(true);
        }

        let method = method.to_ascii_uppercase();
        let prepared = self.prepare(&url, &method, headers, body, credentials);
        self.handlers.insert(
            request_id,
            Handlers {
                url,
                on_success,
                on_error,
                on_loading,
            },
        );

        match prepared {
            Ok(request) => {
                debug!(request_id, method = %request.method, url = %request.url, "api request");
                let token = self.service.request(request_id, request);
                self.in_flight.insert(request_id, token);
            }
            Err(err) => self.settled.push_back((request_id, Err(err))),
        }
        request_id
    }

    pub fn get(&mut self, url: &str, options: FetchOptions) -> RequestId {
        self.fetch(FetchOptions {
            url: url.to_string(),
            method: "GET".to_string(),
            ..options
        })
    }

    pub fn post(&mut self, url: &str, body: Value, options: FetchOptions) -> RequestId {
        self.fetch(FetchOptions {
            url: url.to_string(),
            method: "POST".to_string(),
            body: Some(body),
            ..options
        })
    }

    pub fn put(&mut self, url: &str, body: Value, options: FetchOptions) -> RequestId {
        self.fetch(FetchOptions {
            url: url.to_string(),
            method: "PUT".to_string(),
            body: Some(body),
            ..options
        })
    }

    pub fn delete(&mut self, url: &str, options: FetchOptions) -> RequestId {
        self.fetch(FetchOptions {
            url: url.to_string(),
            method: "DELETE".to_string(),
            ..options
        })
    }

    pub fn patch(&mut self, url: &str, body: Value, options: FetchOptions) -> RequestId {
        self.fetch(FetchOptions {
            url: url.to_string(),
            method: "PATCH".to_string(),
            body: Some(body),
            ..options
        })
    }

    /// Abort one call. It settles through the error path with an
    /// `AbortError` on the next poll. Returns false if the call is not in
    /// flight.
    pub fn cancel(&mut self, request_id: RequestId) -> bool {
        let Some(token) = self.in_flight.remove(&request_id) else {
            return false;
        };
        token.cancel();
        self.service.cancel(request_id);
        self.settled
            .push_back((request_id, Err(TransportError::Aborted)));
        true
    }

    pub fn cancel_all(&mut self) {
        let mut ids: Vec<RequestId> = self.in_flight.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            self.cancel(id);
        }
    }

    pub fn is_in_flight(&self, request_id: RequestId) -> bool {
        self.in_flight.contains_key(&request_id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// True while any call has not yet been delivered through `poll`.
    pub fn has_pending(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Deliver every call that has settled since the last poll.
    pub fn poll(&mut self) -> Vec<FetchOutcome> {
        let mut settled: Vec<_> = self.settled.drain(..).collect();
        settled.extend(
            self.service
                .poll()
                .into_iter()
                .map(|result| (result.request_id, result.outcome)),
        );
        self.deliver(settled)
    }

    /// Like [`poll`](Self::poll) but blocks until nothing is in flight or
    /// `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Vec<FetchOutcome> {
        let mut settled: Vec<_> = self.settled.drain(..).collect();
        settled.extend(
            self.service
                .poll_until_idle(timeout)
                .into_iter()
                .map(|result| (result.request_id, result.outcome)),
        );
        self.deliver(settled)
    }

    /// Widget teardown hook. Requests started by the widget keep running
    /// and their notifications still publish after removal.
    pub fn unmount(&mut self, element: ElementId) {
        debug!(?element, "api widget unmounted");
    }

    fn deliver(
        &mut self,
        settled: Vec<(RequestId, Result<HttpResponse, TransportError>)>,
    ) -> Vec<FetchOutcome> {
        settled
            .into_iter()
            .filter_map(|(id, result)| self.complete(id, result))
            .collect()
    }

    fn complete(
        &mut self,
        request_id: RequestId,
        result: Result<HttpResponse, TransportError>,
    ) -> Option<FetchOutcome> {
        self.in_flight.remove(&request_id);
        let mut handlers = self.handlers.remove(&request_id)?;

        let parsed = result.map_err(ApiError::from).and_then(read_response);

        if let Some(callback) = handlers.on_loading.as_mut() {
            callback(false);
        }

        match parsed {
            Ok((status, data)) => {
                if let Some(callback) = handlers.on_success.as_mut() {
                    callback(&data);
                }
                Some(FetchOutcome::Success {
                    request_id,
                    status,
                    data,
                })
            }
            Err(error) => {
                if let Some(callback) = handlers.on_error.as_mut() {
                    callback(&error);
                }
                error!(
                    request_id,
                    url = %handlers.url,
                    name = %error.name,
                    message = %error.message,
                    "api request failed"
                );
                Some(FetchOutcome::Failure { request_id, error })
            }
        }
    }

    fn prepare(
        &self,
        url: &str,
        method: &str,
        headers: Vec<(String, String)>,
        body: Option<Value>,
        credentials: Credentials,
    ) -> Result<HttpRequest, TransportError> {
        let resolved = self.resolve(url)?;

        let mut merged = vec![("Content-Type".to_string(), "application/json".to_string())];
        for (name, value) in headers {
            match merged.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
                Some(entry) => *entry = (name, value),
                None => merged.push((name, value)),
            }
        }

        let body = body
            .filter(dreamweb_ir::is_truthy)
            .filter(|_| method != "GET" && method != "HEAD")
            .map(|body| match body {
                Value::String(text) => text,
                other => other.to_string(),
            });

        Ok(HttpRequest {
            method: method.to_string(),
            url: resolved.to_string(),
            headers: merged,
            body,
            credentials,
        })
    }

    fn resolve(&self, url: &str) -> Result<Url, TransportError> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base_url
                .as_ref()
                .and_then(|base| base.join(url).ok())
                .ok_or_else(|| TransportError::InvalidRequest(format!("Failed to parse URL from {url}"))),
            Err(err) => Err(TransportError::InvalidRequest(format!(
                "Failed to parse URL from {url}: {err}"
            ))),
        }
    }
}

fn read_response(response: HttpResponse) -> Result<(u16, ResponseData), ApiError> {
    if !response.is_success() {
        return Err(ApiError::http(&response));
    }
    let content_type = response.content_type.clone().unwrap_or_default();
    let data = if content_type.contains("application/json") {
        let value = serde_json::from_slice(&response.body).map_err(|err| ApiError {
            name: "SyntaxError".to_string(),
            message: err.to_string(),
            status: None,
        })?;
        ResponseData::Json(value)
    } else if content_type.contains("text/") {
        ResponseData::Text(String::from_utf8_lossy(&response.body).into_owned())
    } else {
        ResponseData::Blob {
            content_type: response.content_type,
            bytes: response.body,
        }
    };
    Ok((response.status, data))
}

/// Mount adapter for `ApiRequest` / `FetchData` nodes.
///
/// Produces a hidden tracking `div` and, unless `auto_fetch` is explicitly
/// `false`, starts the call. Completions are rebroadcast on `bus` tagged with
/// the node's callback ids rather than invoked directly.
pub fn mount_widget(
    doc: &mut Document,
    api: &mut ApiClient,
    bus: &NotificationBus,
    node: &Node,
) -> dreamweb_dom::Result<ElementId> {
    let props = &node.props;
    let url = props.get("url").map(value_text).unwrap_or_default();

    let container = doc.create_element("div");
    doc.set_style(container, "display", "none")?;
    doc.set_attribute(container, "data-widget-type", node.tag.name())?;
    doc.set_attribute(container, "data-url", url.as_str())?;

    if props.get("auto_fetch") == Some(&Value::Bool(false)) {
        return Ok(container);
    }

    let mut options = FetchOptions::new(url.clone())
        .method(props.str("method").filter(|m| !m.is_empty()).unwrap_or("GET"))
        .credentials(
            props
                .str("credentials")
                .and_then(Credentials::parse)
                .unwrap_or_default(),
        );
    if let Some(Value::Object(headers)) = props.get("headers") {
        for (name, value) in headers {
            options = options.header(name.as_str(), value_text(value));
        }
    }
    options.body = props.get("body").cloned();

    if let Some(callback_id) = node.callbacks.on_success.clone() {
        let bus = bus.clone();
        let url = url.clone();
        options = options.on_success(move |data| {
            bus.publish(Notification::ApiSuccess {
                url: url.clone(),
                callback_id: callback_id.clone(),
                data: data.clone(),
            })
        });
    }
    if let Some(callback_id) = node.callbacks.on_error.clone() {
        let bus = bus.clone();
        let url = url.clone();
        options = options.on_error(move |error| {
            bus.publish(Notification::ApiError {
                url: url.clone(),
                callback_id: callback_id.clone(),
                error: error.clone(),
            })
        });
    }
    if let Some(callback_id) = node.callbacks.on_loading.clone() {
        let bus = bus.clone();
        let url = url.clone();
        options = options.on_loading(move |is_loading| {
            bus.publish(Notification::ApiLoading {
                url: url.clone(),
                callback_id: callback_id.clone(),
                is_loading,
            })
        });
    }

    api.fetch(options);
    Ok(container)
}
