#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dreamweb_io::{
    CancellationToken, ChannelError, HttpRequest, HttpResponse, HttpTransport, TransportError,
};
use dreamweb_scene::{ApiClient, EventBridge, EventChannel, Runtime, RuntimeOptions, ToastPosition};

/// Answers every request with the same response and remembers what it saw.
pub struct StubTransport {
    response: HttpResponse,
    pub seen: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new(status: u16, reason: &str, content_type: &str, body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: HttpResponse {
                status,
                reason: reason.to_string(),
                content_type: Some(content_type.to_string()),
                body: body.as_bytes().to_vec(),
            },
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn ok_json(body: &str) -> Arc<Self> {
        Self::new(200, "OK", "application/json", body)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl HttpTransport for StubTransport {
    fn execute(
        &self,
        request: HttpRequest,
        _cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request);
        Ok(self.response.clone())
    }
}

/// Blocks until cancelled.
pub struct HangingTransport;

impl HttpTransport for HangingTransport {
    fn execute(
        &self,
        _request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        while !cancel.is_cancelled() {
            std::thread::sleep(Duration::from_millis(5));
        }
        Err(TransportError::Aborted)
    }
}

/// Channel handle shared between a test and the bridge that owns it.
#[derive(Clone, Default)]
pub struct Recording {
    pub open: Rc<RefCell<bool>>,
    pub sent: Rc<RefCell<Vec<String>>>,
    pub inbound: Rc<RefCell<VecDeque<String>>>,
}

impl Recording {
    pub fn open() -> Self {
        let recording = Self::default();
        *recording.open.borrow_mut() = true;
        recording
    }

    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .borrow()
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .collect()
    }

    pub fn push_inbound(&self, frame: &str) {
        self.inbound.borrow_mut().push_back(frame.to_string());
    }
}

impl EventChannel for Recording {
    fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    fn send(&mut self, text: String) -> Result<(), ChannelError> {
        if !*self.open.borrow() {
            return Err(ChannelError::Closed);
        }
        self.sent.borrow_mut().push(text);
        Ok(())
    }

    fn drain_inbound(&mut self) -> Vec<String> {
        self.inbound.borrow_mut().drain(..).collect()
    }
}

pub fn runtime_with(transport: Arc<dyn HttpTransport>, channel: Recording) -> Runtime {
    Runtime::new(RuntimeOptions {
        root_id: "app".to_string(),
        api: ApiClient::new(transport, None),
        bridge: EventBridge::new(Box::new(channel)),
        toast_position: ToastPosition::TopRight,
        toast_duration: Duration::from_millis(3000),
    })
    .unwrap()
}

pub fn runtime() -> (Runtime, Recording) {
    let channel = Recording::open();
    let runtime = runtime_with(StubTransport::ok_json("{}"), channel.clone());
    (runtime, channel)
}
