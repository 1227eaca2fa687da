//! Retained element document the renderer builds into.
//!
//! This is the host box model: a tree of elements with inline style
//! declarations, attributes, text, raw markup and event bindings. Layout is
//! left to whatever host displays the markup produced by [`Document::to_html`].

mod binding;
mod document;
mod html;
mod style;

pub use binding::{Binding, UiEvent};
pub use document::{Document, ElementId};
pub use style::Style;

use thiserror::Error;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DomError>;

/// Errors raised by tree mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The id refers to a node that has been released.
    #[error("element {0:?} no longer exists")]
    Stale(ElementId),

    /// The operation needs an element but the id is a text node.
    #[error("node {0:?} is not an element")]
    NotAnElement(ElementId),

    /// Inserting the node would make it its own ancestor.
    #[error("cannot insert {child:?} under its descendant {parent:?}")]
    Hierarchy { parent: ElementId, child: ElementId },
}
