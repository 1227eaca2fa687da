//! Flat client-side router.
//!
//! A route table maps names to pre-built elements. Navigating swaps the
//! active element into the router's container and mirrors the name into the
//! address fragment. Unknown names are logged and ignored.

use dreamweb_dom::{Document, ElementId};
use tracing::{debug, warn};

/// The address bar, reduced to the part the router cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    fragment: String,
}

impl Location {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment without the leading `#`.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// `#name`, or empty when there is no fragment.
    pub fn hash(&self) -> String {
        if self.fragment.is_empty() {
            String::new()
        } else {
            format!("#{}", self.fragment)
        }
    }

    pub fn set_fragment(&mut self, fragment: &str) {
        self.fragment = fragment.trim_start_matches('#').to_string();
    }
}

#[derive(Debug, Default)]
pub struct Router {
    /// Insertion order decides the default route.
    routes: Vec<(String, ElementId)>,
    current: Option<String>,
    container: Option<ElementId>,
    location: Location,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the route table and show `initial`, or the first route when none
    /// is given.
    pub fn init(
        &mut self,
        doc: &mut Document,
        container: ElementId,
        routes: Vec<(String, ElementId)>,
        initial: Option<&str>,
    ) -> dreamweb_dom::Result<bool> {
        self.container = Some(container);
        self.routes = routes;
        let first = initial
            .map(str::to_string)
            .or_else(|| self.routes.first().map(|(name, _)| name.clone()));
        match first {
            Some(name) => self.navigate(doc, &name),
            None => {
                warn!("router initialised without routes");
                Ok(false)
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.container.is_some()
    }

    pub fn current_route(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn route_names(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|(name, _)| name.as_str())
    }

    fn route(&self, name: &str) -> Option<ElementId> {
        self.routes
            .iter()
            .find(|(route, _)| route == name)
            .map(|(_, element)| *element)
    }

    /// Show `name`. Returns false, changing nothing, when the route does not
    /// exist or its page has been freed.
    pub fn navigate(&mut self, doc: &mut Document, name: &str) -> dreamweb_dom::Result<bool> {
        let Some(content) = self.route(name) else {
            warn!(route = name, "route not found");
            return Ok(false);
        };
        if !doc.contains(content) {
            warn!(route = name, "route page no longer exists");
            return Ok(false);
        }

        self.current = Some(name.to_string());
        self.location.set_fragment(name);

        let Some(container) = self.container else {
            return Ok(true);
        };
        if !doc.contains(container) {
            debug!(route = name, "router container is gone, view not updated");
            return Ok(true);
        }
        // Pages survive the swap; anything else in the container is freed.
        for child in doc.children(container).to_vec() {
            if self.owns(child) {
                doc.detach(child);
            } else {
                doc.release(child);
            }
        }
        doc.append_child(container, content)?;
        Ok(true)
    }

    /// Take every route page out of the tree without freeing it, so a
    /// re-render of an enclosing element leaves the pages usable.
    pub fn detach_pages(&self, doc: &mut Document) {
        for (_, page) in &self.routes {
            doc.detach(*page);
        }
    }

    fn owns(&self, element: ElementId) -> bool {
        self.routes.iter().any(|(_, page)| *page == element)
    }

    /// The address fragment changed outside the router (back button, typed
    /// URL). Empty or unknown fragments are ignored.
    pub fn on_fragment_change(&mut self, doc: &mut Document, fragment: &str) -> dreamweb_dom::Result<bool> {
        let name = fragment.trim_start_matches('#');
        self.location.set_fragment(name);
        if name.is_empty() || self.route(name).is_none() {
            return Ok(false);
        }
        self.navigate(doc, name)
    }
}
