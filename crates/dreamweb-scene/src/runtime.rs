//! The page runtime.
//!
//! Owns the document and every service the renderer talks to. All of it is
//! driven from one context: the host feeds interactions through
//! [`Runtime::dispatch`] and calls [`Runtime::pump`] from its loop to pick up
//! reloads, finished API calls and toast timers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dreamweb_config::DreamwebConfig;
use dreamweb_dom::{Binding, Document, ElementId, UiEvent};
use dreamweb_io::ReqwestTransport;
use dreamweb_ir::{Action, Node};
use tracing::{debug, info, warn};
use url::Url;

use crate::Result;
use crate::api::{ApiClient, FetchOutcome};
use crate::bridge::EventBridge;
use crate::notify::{Notification, NotificationBus};
use crate::reload::{self, DevEndpoint};
use crate::render::Renderer;
use crate::router::Router;
use crate::state::StateStore;
use crate::toast::{ToastId, ToastManager, ToastPosition};

/// What one [`Runtime::pump`] call did.
#[derive(Debug, Default)]
pub struct PumpReport {
    /// Trees replaced by reload frames.
    pub reloads: usize,
    /// API calls delivered, in delivery order.
    pub completed: Vec<FetchOutcome>,
    pub toasts_removed: usize,
}

/// Construction parameters for [`Runtime::new`].
pub struct RuntimeOptions {
    pub root_id: String,
    pub api: ApiClient,
    pub bridge: EventBridge,
    pub toast_position: ToastPosition,
    pub toast_duration: Duration,
}

pub struct Runtime {
    doc: Document,
    root: ElementId,
    tree: Option<Node>,
    api: ApiClient,
    bus: NotificationBus,
    bridge: EventBridge,
    router: Router,
    toasts: ToastManager,
    state: StateStore,
    methods: HashMap<String, Box<dyn FnMut()>>,
    widgets: Vec<ElementId>,
}

impl Runtime {
    pub fn new(options: RuntimeOptions) -> Result<Self> {
        let mut doc = Document::new();
        let root = doc.mount_point(&options.root_id)?;
        let toasts = ToastManager::new(&mut doc, options.toast_position, options.toast_duration)?;
        Ok(Self {
            doc,
            root,
            tree: None,
            api: options.api,
            bus: NotificationBus::new(),
            bridge: options.bridge,
            router: Router::new(),
            toasts,
            state: StateStore::new(),
            methods: HashMap::new(),
            widgets: Vec::new(),
        })
    }

    /// Wire the default services from configuration: reqwest for HTTP and,
    /// on loopback pages with live reload enabled, the dev WebSocket.
    pub fn from_config(config: &DreamwebConfig) -> Result<Self> {
        let page_url = config
            .runtime
            .page_url
            .as_deref()
            .map(Url::parse)
            .transpose()?;

        let transport = ReqwestTransport::new(
            &config.http.user_agent,
            config.http.timeout_ms.map(Duration::from_millis),
        )?;
        let api = ApiClient::new(Arc::new(transport), page_url.clone());

        let endpoint = page_url
            .as_ref()
            .filter(|_| config.dev.live_reload)
            .and_then(DevEndpoint::detect);
        let bridge = match endpoint {
            Some(endpoint) => {
                info!(url = endpoint.url(), "live reload enabled");
                let delay = Duration::from_millis(config.dev.reconnect_delay_ms);
                EventBridge::new(Box::new(endpoint.connect(delay)))
            }
            None => EventBridge::disconnected(),
        };

        let toast_position = ToastPosition::parse(&config.toast.position).unwrap_or_else(|| {
            warn!(position = %config.toast.position, "unknown toast position, using top-right");
            ToastPosition::default()
        });

        Self::new(RuntimeOptions {
            root_id: config.runtime.root_id.clone(),
            api,
            bridge,
            toast_position,
            toast_duration: Duration::from_millis(config.toast.duration_ms),
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The mount point.
    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn tree(&self) -> Option<&Node> {
        self.tree.as_ref()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut ApiClient {
        &mut self.api
    }

    pub fn bridge(&self) -> &EventBridge {
        &self.bridge
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn toasts(&self) -> &ToastManager {
        &self.toasts
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateStore {
        &mut self.state
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    /// Take pending notifications.
    pub fn notifications(&self) -> Vec<Notification> {
        self.bus.drain()
    }

    /// Replace the tree and render it from scratch.
    pub fn render(&mut self, tree: Node) -> Result<ElementId> {
        self.tree = Some(tree);
        self.rerender()
    }

    /// Render the current tree again, discarding the old elements. Route
    /// pages are detached first and stay available to the router.
    pub fn rerender(&mut self) -> Result<ElementId> {
        for widget in self.widgets.drain(..) {
            self.api.unmount(widget);
        }
        self.router.detach_pages(&mut self.doc);
        let mut renderer = Renderer::new(&mut self.doc, &mut self.api, &self.bus);
        let top = renderer.render(self.root, self.tree.as_ref())?;
        self.widgets = renderer.mounted_widgets().to_vec();
        debug!(nodes = self.tree.as_ref().map_or(0, Node::count), "rendered");
        Ok(top)
    }

    /// Deliver `event` to `target`, then to its ancestors if the event
    /// bubbles. Returns how many bindings ran.
    pub fn dispatch(&mut self, target: ElementId, event: UiEvent, now: Instant) -> Result<usize> {
        let mut path = vec![target];
        if event.bubbles() {
            let mut cursor = self.doc.parent(target);
            while let Some(parent) = cursor {
                path.push(parent);
                cursor = self.doc.parent(parent);
            }
        }

        let mut handled = 0;
        for element in path {
            let bindings: Vec<Binding> = self
                .doc
                .bindings(element)
                .iter()
                .filter(|b| b.responds_to(&event))
                .cloned()
                .collect();
            for binding in bindings {
                self.apply(element, binding, &event, now)?;
                handled += 1;
            }
        }
        Ok(handled)
    }

    fn apply(&mut self, element: ElementId, binding: Binding, event: &UiEvent, now: Instant) -> Result<()> {
        match binding {
            Binding::Bridge { kind, handler } => {
                self.bridge.handle_event(kind, &handler, event.value());
            }
            Binding::HoverLift => {
                let (transform, shadow) = if matches!(event, UiEvent::MouseEnter) {
                    ("translateY(-1px)", "0 4px 6px rgba(0,0,0,0.1)")
                } else {
                    ("translateY(0)", "none")
                };
                self.doc.set_style(element, "transform", transform)?;
                self.doc.set_style(element, "box-shadow", shadow)?;
            }
            Binding::FocusRing => {
                let (border, shadow) = if matches!(event, UiEvent::Focus) {
                    ("#3b82f6", "0 0 0 3px rgba(59, 130, 246, 0.1)")
                } else {
                    ("#d1d5db", "none")
                };
                self.doc.set_style(element, "border-color", border)?;
                self.doc.set_style(element, "box-shadow", shadow)?;
            }
            Binding::DismissToast => {
                self.toasts.dismiss_element(&mut self.doc, element, now)?;
            }
        }
        Ok(())
    }

    /// Register a host method reachable from target actions.
    pub fn register_method(&mut self, name: impl Into<String>, method: impl FnMut() + 'static) {
        self.methods.insert(name.into(), Box::new(method));
    }

    pub fn execute(&mut self, action: &Action, now: Instant) -> Result<()> {
        match action {
            Action::Toast { message } => {
                self.show_toast(message, None, now)?;
            }
            Action::Modal { title, content } => {
                self.bus.publish(Notification::ModalRequested {
                    title: title.clone(),
                    content: content.clone(),
                });
            }
            Action::Target(name) => match self.methods.get_mut(name) {
                Some(method) => method(),
                None => {
                    self.navigate(name)?;
                }
            },
        }
        Ok(())
    }

    /// Parse and run an action string. Empty strings do nothing.
    pub fn execute_str(&mut self, source: &str, now: Instant) -> Result<()> {
        match Action::parse(source) {
            Some(action) => self.execute(&action, now),
            None => Ok(()),
        }
    }

    /// Build every route's content up front and start the router in
    /// `container`.
    pub fn init_router(
        &mut self,
        container: ElementId,
        routes: Vec<(String, Node)>,
        initial: Option<&str>,
    ) -> Result<bool> {
        let mut built = Vec::with_capacity(routes.len());
        let mut renderer = Renderer::new(&mut self.doc, &mut self.api, &self.bus);
        for (name, node) in &routes {
            let element = renderer.create_element(Some(node))?;
            built.push((name.clone(), element));
        }
        self.widgets.extend_from_slice(renderer.mounted_widgets());
        Ok(self.router.init(&mut self.doc, container, built, initial)?)
    }

    pub fn navigate(&mut self, route: &str) -> Result<bool> {
        Ok(self.router.navigate(&mut self.doc, route)?)
    }

    /// The address fragment changed (`hashchange`).
    pub fn set_fragment(&mut self, fragment: &str) -> Result<bool> {
        Ok(self.router.on_fragment_change(&mut self.doc, fragment)?)
    }

    pub fn show_toast(&mut self, message: &str, duration: Option<Duration>, now: Instant) -> Result<ToastId> {
        Ok(self.toasts.show(&mut self.doc, message, duration, now)?)
    }

    /// Run everything that became due: reload frames, settled API calls and
    /// toast timers, in that order.
    pub fn pump(&mut self, now: Instant) -> Result<PumpReport> {
        let mut report = PumpReport::default();
        for frame in self.bridge.drain_inbound() {
            if let Some(tree) = reload::reload_tree(&frame) {
                self.render(tree)?;
                info!("hot reload applied");
                report.reloads += 1;
            }
        }
        report.completed = self.api.poll();
        report.toasts_removed = self.toasts.tick(&mut self.doc, now)?;
        Ok(report)
    }

    /// Markup of everything under the mount point.
    pub fn html(&self) -> String {
        self.doc.inner_to_html(self.root)
    }

    pub fn to_page(&self) -> String {
        self.doc.to_page()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("root", &self.root)
            .field("router", &self.router)
            .field("toasts", &self.toasts.len())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
