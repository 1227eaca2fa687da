//! Messages exchanged with the backend over the dev channel.
//!
//! Both directions use a `type` tag in snake_case, matching the JSON the
//! dev server reads and writes.

use serde::{Deserialize, Serialize};

use crate::{HandlerId, Node, Result};

/// The interaction kinds the bridge forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Click,
    Change,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Change => "change",
        }
    }
}

/// Renderer to backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A UI interaction fired on an element bound to `handler`. `value` is
    /// only present for `change`.
    Event {
        event: EventKind,
        handler: HandlerId,
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

impl OutboundMessage {
    pub fn event(event: EventKind, handler: HandlerId, value: Option<String>) -> Self {
        OutboundMessage::Event {
            event,
            handler,
            value,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Backend to renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Replace the whole tree and render it again.
    Reload { tree: Node },
    /// Any other `type`; ignored by the runtime.
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
