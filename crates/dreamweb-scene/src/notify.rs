//! Page-wide notification bus.
//!
//! Widgets that do not own their listeners (the API mount adapter, modal
//! actions) publish here instead of calling back directly. The host drains the
//! queue on its own schedule.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use dreamweb_ir::HandlerId;

use crate::api::{ApiError, ResponseData};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// `dreamweb:api:success`
    ApiSuccess {
        url: String,
        callback_id: HandlerId,
        data: ResponseData,
    },
    /// `dreamweb:api:error`
    ApiError {
        url: String,
        callback_id: HandlerId,
        error: ApiError,
    },
    /// `dreamweb:api:loading`
    ApiLoading {
        url: String,
        callback_id: HandlerId,
        is_loading: bool,
    },
    /// A `modal:` action. No modal widget ships with the runtime, so hosts
    /// that want one listen for this.
    ModalRequested { title: String, content: String },
}

/// Shared handle to the notification queue. Clones publish into the same
/// queue.
#[derive(Debug, Clone, Default)]
pub struct NotificationBus {
    queue: Rc<RefCell<VecDeque<Notification>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, notification: Notification) {
        self.queue.borrow_mut().push_back(notification);
    }

    /// Take every pending notification in publish order.
    pub fn drain(&self) -> Vec<Notification> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}
