use dreamweb_ir::{EventKind, HandlerId};

/// Behaviour attached to an element, stored as data and interpreted by the
/// runtime when a [`UiEvent`] reaches the element.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Forward the interaction to the backend under `handler`.
    Bridge { kind: EventKind, handler: HandlerId },
    /// Lift on pointer enter, settle on pointer leave (enabled buttons).
    HoverLift,
    /// Highlight border and ring while focused (text inputs).
    FocusRing,
    /// Dismiss the toast this element belongs to.
    DismissToast,
}

impl Binding {
    pub fn responds_to(&self, event: &UiEvent) -> bool {
        match self {
            Binding::Bridge { kind, .. } => event.kind() == Some(*kind),
            Binding::HoverLift => matches!(event, UiEvent::MouseEnter | UiEvent::MouseLeave),
            Binding::FocusRing => matches!(event, UiEvent::Focus | UiEvent::Blur),
            Binding::DismissToast => matches!(event, UiEvent::Click),
        }
    }
}

/// An interaction delivered by the host to a target element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Click,
    /// The control's current value after the change.
    Change(String),
    MouseEnter,
    MouseLeave,
    Focus,
    Blur,
}

impl UiEvent {
    /// The bridgeable kind, if any.
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            UiEvent::Click => Some(EventKind::Click),
            UiEvent::Change(_) => Some(EventKind::Change),
            _ => None,
        }
    }

    /// Whether the event propagates to ancestors of its target.
    pub fn bubbles(&self) -> bool {
        matches!(self, UiEvent::Click | UiEvent::Change(_))
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            UiEvent::Change(value) => Some(value),
            _ => None,
        }
    }
}
