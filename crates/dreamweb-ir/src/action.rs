//! Structured actions.
//!
//! Generated apps attach action strings such as `toast:Saved` or
//! `modal:Title|Body` to widgets. They are parsed once into [`Action`] so a
//! literal route name can never be mistaken for a keyword further down.

/// What an action string asks the runtime to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Show a toast with the given message.
    Toast { message: String },
    /// Open a modal dialog.
    Modal { title: String, content: String },
    /// A host method name or, failing that, a route name.
    Target(String),
}

impl Action {
    /// Parse the legacy string form. Empty input is not an action.
    pub fn parse(source: &str) -> Option<Action> {
        if source.is_empty() {
            return None;
        }
        if let Some(message) = source.strip_prefix("toast:") {
            return Some(Action::Toast {
                message: message.to_string(),
            });
        }
        if let Some(rest) = source.strip_prefix("modal:") {
            let mut parts = rest.split('|');
            let title = parts.next().unwrap_or_default().to_string();
            let content = parts.next().unwrap_or_default().to_string();
            return Some(Action::Modal { title, content });
        }
        Some(Action::Target(source.to_string()))
    }
}
