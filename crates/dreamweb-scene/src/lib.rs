//! DreamWeb renderer: turns component trees into live elements.
//!
//! Modules, leaf first:
//! - `style`: style token resolution
//! - `render`: the node renderer
//! - `bridge`: forwards interactions to the backend
//! - `api`: the API request widget
//! - `router`, `toast`: the remaining widgets
//! - `state`: flat key/value state
//! - `reload`: dev server detection and reload frames
//! - `runtime`: owns all of the above for one page

pub mod api;
pub mod bridge;
mod error;
pub mod notify;
pub mod reload;
pub mod render;
pub mod router;
pub mod runtime;
pub mod state;
pub mod style;
pub mod toast;

pub use api::{ApiClient, ApiError, FetchOptions, FetchOutcome, RequestId, ResponseData};
pub use bridge::{EventBridge, EventChannel};
pub use error::{Result, RuntimeError};
pub use notify::{Notification, NotificationBus};
pub use reload::DevEndpoint;
pub use render::Renderer;
pub use router::{Location, Router};
pub use runtime::{PumpReport, Runtime, RuntimeOptions};
pub use state::StateStore;
pub use toast::{ToastId, ToastManager, ToastPosition};

pub use dreamweb_dom::{Binding, Document, ElementId, UiEvent};
pub use dreamweb_ir::{Action, Node, Tag};
