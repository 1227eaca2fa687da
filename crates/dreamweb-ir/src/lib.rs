//! Intermediate representation for DreamWeb component trees.
//!
//! The generator on the backend produces a JSON tree of component
//! descriptions. This crate owns that data model plus the small wire
//! vocabulary exchanged with the backend over the dev channel:
//! - `node`: component nodes, props, event and callback bindings
//! - `message`: outbound interaction events and inbound reloads
//! - `action`: structured form of the legacy action strings

pub mod action;
pub mod message;
pub mod node;

pub use action::Action;
pub use message::{EventKind, InboundMessage, OutboundMessage};
pub use node::{Callbacks, Events, HandlerId, Node, NodeTag, Props, Tag, is_truthy};

use thiserror::Error;

/// Result type for IR operations.
pub type Result<T> = std::result::Result<T, IrError>;

/// Errors raised while reading or writing IR documents.
#[derive(Error, Debug)]
pub enum IrError {
    /// The payload was not valid JSON or did not match the tree shape.
    #[error("invalid component tree JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading the payload failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
