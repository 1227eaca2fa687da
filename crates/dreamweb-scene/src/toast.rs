//! Toast notifications.
//!
//! Toasts stack in a fixed-position container in `<body>`. Each one is
//! removed after its display time plus a 300 ms exit transition; clicking it
//! starts the exit right away. Time is passed in by the caller, so nothing
//! here sleeps or spawns.

use std::time::{Duration, Instant};

use dreamweb_dom::{Binding, Document, ElementId};
use tracing::debug;

pub const CONTAINER_ID: &str = "dreamweb-toast-container";
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);
pub const EXIT_DURATION: Duration = Duration::from_millis(300);

const KEYFRAMES: &str = "@keyframes dreamweb-toast-in { from { opacity: 0; transform: translateX(100%); } to { opacity: 1; transform: translateX(0); } }\n@keyframes dreamweb-toast-out { from { opacity: 1; transform: translateX(0); } to { opacity: 0; transform: translateX(100%); } }";

/// Screen corner the stack is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastPosition {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
    TopCenter,
    BottomCenter,
}

impl ToastPosition {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "top-right" => Some(ToastPosition::TopRight),
            "top-left" => Some(ToastPosition::TopLeft),
            "bottom-right" => Some(ToastPosition::BottomRight),
            "bottom-left" => Some(ToastPosition::BottomLeft),
            "top-center" => Some(ToastPosition::TopCenter),
            "bottom-center" => Some(ToastPosition::BottomCenter),
            _ => None,
        }
    }

    fn declarations(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ToastPosition::TopRight => &[("top", "20px"), ("right", "20px")],
            ToastPosition::TopLeft => &[("top", "20px"), ("left", "20px")],
            ToastPosition::BottomRight => &[("bottom", "20px"), ("right", "20px")],
            ToastPosition::BottomLeft => &[("bottom", "20px"), ("left", "20px")],
            ToastPosition::TopCenter => &[
                ("top", "20px"),
                ("left", "50%"),
                ("transform", "translateX(-50%)"),
            ],
            ToastPosition::BottomCenter => &[
                ("bottom", "20px"),
                ("left", "50%"),
                ("transform", "translateX(-50%)"),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(u64);

#[derive(Debug)]
struct Toast {
    id: ToastId,
    element: ElementId,
    dismiss_at: Instant,
    /// Set once the exit transition has started.
    remove_at: Option<Instant>,
}

#[derive(Debug)]
pub struct ToastManager {
    container: ElementId,
    default_duration: Duration,
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastManager {
    /// Create and mount the stacking container and the toast keyframes.
    pub fn new(
        doc: &mut Document,
        position: ToastPosition,
        default_duration: Duration,
    ) -> dreamweb_dom::Result<Self> {
        let container = doc.create_element("div");
        doc.set_attribute(container, "id", CONTAINER_ID)?;
        doc.set_style(container, "position", "fixed")?;
        for (property, value) in position.declarations() {
            doc.set_style(container, property, *value)?;
        }
        doc.set_style(container, "z-index", "10000")?;
        doc.set_style(container, "display", "flex")?;
        doc.set_style(container, "flex-direction", "column")?;
        doc.set_style(container, "gap", "10px")?;
        doc.append_child(doc.body(), container)?;

        let keyframes = doc.create_element("style");
        doc.set_text_content(keyframes, KEYFRAMES)?;
        doc.append_child(doc.head(), keyframes)?;

        Ok(Self {
            container,
            default_duration,
            toasts: Vec::new(),
            next_id: 0,
        })
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }

    /// Toasts still in the container, exiting ones included.
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn element(&self, id: ToastId) -> Option<ElementId> {
        self.toasts.iter().find(|t| t.id == id).map(|t| t.element)
    }

    /// Append a toast. It starts its exit after `duration` (or the default).
    pub fn show(
        &mut self,
        doc: &mut Document,
        message: &str,
        duration: Option<Duration>,
        now: Instant,
    ) -> dreamweb_dom::Result<ToastId> {
        let element = doc.create_element("div");
        doc.set_attribute(element, "class", "dreamweb-toast")?;
        doc.set_text_content(element, message)?;
        for (property, value) in [
            ("background", "#323232"),
            ("color", "white"),
            ("padding", "12px 24px"),
            ("border-radius", "4px"),
            ("box-shadow", "0 4px 12px rgba(0, 0, 0, 0.15)"),
            ("font-size", "14px"),
            ("animation", "dreamweb-toast-in 0.3s ease"),
            ("cursor", "pointer"),
        ] {
            doc.set_style(element, property, value)?;
        }
        doc.add_binding(element, Binding::DismissToast)?;
        doc.append_child(self.container, element)?;

        self.next_id += 1;
        let id = ToastId(self.next_id);
        self.toasts.push(Toast {
            id,
            element,
            dismiss_at: now + duration.unwrap_or(self.default_duration),
            remove_at: None,
        });
        debug!(toast = id.0, message, "toast shown");
        Ok(id)
    }

    /// Start the exit transition now. Returns false for unknown toasts.
    pub fn dismiss(&mut self, doc: &mut Document, id: ToastId, now: Instant) -> dreamweb_dom::Result<bool> {
        let Some(toast) = self.toasts.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        start_exit(doc, toast, now)?;
        Ok(true)
    }

    /// Dismiss the toast rendered as `element`, if any.
    pub fn dismiss_element(
        &mut self,
        doc: &mut Document,
        element: ElementId,
        now: Instant,
    ) -> dreamweb_dom::Result<bool> {
        let Some(toast) = self.toasts.iter_mut().find(|t| t.element == element) else {
            return Ok(false);
        };
        start_exit(doc, toast, now)?;
        Ok(true)
    }

    /// Advance timers to `now`: start due exits and remove finished toasts.
    /// Returns how many toasts were removed.
    pub fn tick(&mut self, doc: &mut Document, now: Instant) -> dreamweb_dom::Result<usize> {
        for toast in &mut self.toasts {
            if toast.remove_at.is_none() && now >= toast.dismiss_at {
                let started = toast.dismiss_at;
                start_exit(doc, toast, started)?;
            }
        }

        let before = self.toasts.len();
        let mut kept = Vec::with_capacity(before);
        for toast in self.toasts.drain(..) {
            match toast.remove_at {
                Some(at) if now >= at => {
                    doc.release(toast.element);
                    debug!(toast = toast.id.0, "toast removed");
                }
                _ => kept.push(toast),
            }
        }
        self.toasts = kept;
        Ok(before - self.toasts.len())
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.toasts
            .iter()
            .map(|t| t.remove_at.unwrap_or(t.dismiss_at))
            .min()
    }
}

/// Repeated dismissals keep the first exit deadline.
fn start_exit(doc: &mut Document, toast: &mut Toast, now: Instant) -> dreamweb_dom::Result<()> {
    if toast.remove_at.is_some() {
        return Ok(());
    }
    toast.remove_at = Some(now + EXIT_DURATION);
    if doc.contains(toast.element) {
        doc.set_style(toast.element, "animation", "dreamweb-toast-out 0.3s ease")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(doc: &mut Document) -> ToastManager {
        ToastManager::new(doc, ToastPosition::default(), DEFAULT_DURATION).unwrap()
    }

    #[test]
    fn container_is_fixed_top_right() {
        let mut doc = Document::new();
        let toasts = manager(&mut doc);
        let container = toasts.container();
        assert_eq!(doc.parent(container), Some(doc.body()));
        assert_eq!(doc.style(container, "position"), Some("fixed"));
        assert_eq!(doc.style(container, "top"), Some("20px"));
        assert_eq!(doc.style(container, "right"), Some("20px"));
        assert_eq!(doc.style(container, "z-index"), Some("10000"));
    }

    #[test]
    fn removed_after_duration_plus_exit() {
        let mut doc = Document::new();
        let mut toasts = manager(&mut doc);
        let t0 = Instant::now();
        let id = toasts
            .show(&mut doc, "hi", Some(Duration::from_millis(100)), t0)
            .unwrap();
        let element = toasts.element(id).unwrap();
        assert_eq!(doc.text_content(toasts.container()), "hi");

        assert_eq!(toasts.tick(&mut doc, t0 + Duration::from_millis(99)).unwrap(), 0);
        assert_eq!(toasts.tick(&mut doc, t0 + Duration::from_millis(150)).unwrap(), 0);
        assert_eq!(doc.style(element, "animation"), Some("dreamweb-toast-out 0.3s ease"));
        assert_eq!(toasts.tick(&mut doc, t0 + Duration::from_millis(400)).unwrap(), 1);
        assert!(!doc.contains(element));
        assert!(doc.children(toasts.container()).is_empty());
    }

    #[test]
    fn click_dismissal_and_stacking() {
        let mut doc = Document::new();
        let mut toasts = manager(&mut doc);
        let t0 = Instant::now();
        let first = toasts.show(&mut doc, "one", None, t0).unwrap();
        toasts.show(&mut doc, "one", None, t0).unwrap();
        toasts.show(&mut doc, "two", None, t0).unwrap();
        assert_eq!(doc.children(toasts.container()).len(), 3);

        let element = toasts.element(first).unwrap();
        assert!(toasts.dismiss_element(&mut doc, element, t0).unwrap());
        // A second click does not push the removal back.
        assert!(toasts.dismiss(&mut doc, first, t0 + Duration::from_millis(200)).unwrap());
        assert_eq!(toasts.tick(&mut doc, t0 + Duration::from_millis(300)).unwrap(), 1);
        assert_eq!(toasts.len(), 2);
        assert_eq!(doc.text_content(toasts.container()), "onetwo");
    }

    #[test]
    fn positions_parse() {
        assert_eq!(ToastPosition::parse("bottom-left"), Some(ToastPosition::BottomLeft));
        assert_eq!(ToastPosition::parse("middle"), None);
    }
}
