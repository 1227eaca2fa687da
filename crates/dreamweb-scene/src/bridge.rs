//! Event bridge: forwards `click` / `change` interactions to the backend.
//!
//! Events are only sent while the channel reports itself open. Anything
//! fired while it is closed is dropped; there is no queue and no retry.

use dreamweb_dom::{Binding, Document, ElementId};
use dreamweb_io::{ChannelError, WsChannel};
use dreamweb_ir::{EventKind, Events, HandlerId, OutboundMessage};
use tracing::{trace, warn};

/// A bidirectional text channel to the backend.
pub trait EventChannel {
    fn is_open(&self) -> bool;
    fn send(&mut self, text: String) -> Result<(), ChannelError>;
    /// Text frames received since the last call.
    fn drain_inbound(&mut self) -> Vec<String>;
}

impl EventChannel for WsChannel {
    fn is_open(&self) -> bool {
        WsChannel::is_open(self)
    }

    fn send(&mut self, text: String) -> Result<(), ChannelError> {
        WsChannel::send(self, text)
    }

    fn drain_inbound(&mut self) -> Vec<String> {
        WsChannel::drain_inbound(self)
    }
}

/// Bind the node's `events` map onto `element`.
pub fn attach_events(doc: &mut Document, element: ElementId, events: &Events) -> dreamweb_dom::Result<()> {
    if let Some(handler) = &events.click {
        doc.add_binding(
            element,
            Binding::Bridge {
                kind: EventKind::Click,
                handler: handler.clone(),
            },
        )?;
    }
    if let Some(handler) = &events.change {
        doc.add_binding(
            element,
            Binding::Bridge {
                kind: EventKind::Change,
                handler: handler.clone(),
            },
        )?;
    }
    Ok(())
}

pub struct EventBridge {
    channel: Option<Box<dyn EventChannel>>,
    forwarded: u64,
    dropped: u64,
}

impl EventBridge {
    pub fn new(channel: Box<dyn EventChannel>) -> Self {
        Self {
            channel: Some(channel),
            forwarded: 0,
            dropped: 0,
        }
    }

    /// A bridge with no backend; every event is dropped.
    pub fn disconnected() -> Self {
        Self {
            channel: None,
            forwarded: 0,
            dropped: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| c.is_open())
    }

    /// Send `{type: "event", event, handler, value}`. Returns whether the
    /// message left.
    pub fn handle_event(&mut self, kind: EventKind, handler: &HandlerId, value: Option<&str>) -> bool {
        let Some(channel) = self.channel.as_mut().filter(|c| c.is_open()) else {
            trace!(event = kind.as_str(), %handler, "channel closed, event dropped");
            self.dropped += 1;
            return false;
        };
        let message = OutboundMessage::event(kind, handler.clone(), value.map(str::to_string));
        let text = match message.to_json() {
            Ok(text) => text,
            Err(err) => {
                warn!(?err, "failed to encode event");
                self.dropped += 1;
                return false;
            }
        };
        match channel.send(text) {
            Ok(()) => {
                self.forwarded += 1;
                true
            }
            Err(err) => {
                trace!(%err, event = kind.as_str(), %handler, "event dropped");
                self.dropped += 1;
                false
            }
        }
    }

    pub fn drain_inbound(&mut self) -> Vec<String> {
        self.channel
            .as_mut()
            .map(|c| c.drain_inbound())
            .unwrap_or_default()
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Loopback {
        open: bool,
        sent: Rc<RefCell<Vec<String>>>,
    }

    impl EventChannel for Loopback {
        fn is_open(&self) -> bool {
            self.open
        }

        fn send(&mut self, text: String) -> Result<(), ChannelError> {
            self.sent.borrow_mut().push(text);
            Ok(())
        }

        fn drain_inbound(&mut self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn open_channel_receives_event_json() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut bridge = EventBridge::new(Box::new(Loopback {
            open: true,
            sent: sent.clone(),
        }));
        assert!(bridge.handle_event(EventKind::Change, &HandlerId::from("h9"), Some("abc")));
        assert!(bridge.handle_event(EventKind::Click, &HandlerId::from(12u64), None));

        let sent = sent.borrow();
        let first: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(
            first,
            serde_json::json!({"type": "event", "event": "change", "handler": "h9", "value": "abc"})
        );
        let second: serde_json::Value = serde_json::from_str(&sent[1]).unwrap();
        assert_eq!(second, serde_json::json!({"type": "event", "event": "click", "handler": 12}));
        assert_eq!(bridge.forwarded(), 2);
    }

    #[test]
    fn closed_channel_drops() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut bridge = EventBridge::new(Box::new(Loopback {
            open: false,
            sent: sent.clone(),
        }));
        assert!(!bridge.handle_event(EventKind::Click, &HandlerId::from("h1"), None));
        assert!(sent.borrow().is_empty());
        assert_eq!(bridge.dropped(), 1);

        let mut none = EventBridge::disconnected();
        assert!(!none.handle_event(EventKind::Click, &HandlerId::from("h1"), None));
        assert!(none.drain_inbound().is_empty());
    }

    #[test]
    fn attaches_bridge_bindings() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        let events = Events {
            click: None,
            change: Some(HandlerId::from("on_change_1")),
        };
        attach_events(&mut doc, input, &events).unwrap();
        assert_eq!(
            doc.bindings(input),
            &[Binding::Bridge {
                kind: EventKind::Change,
                handler: HandlerId::from("on_change_1"),
            }]
        );
    }
}
