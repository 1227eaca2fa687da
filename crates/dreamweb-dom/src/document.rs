use tracing::trace;

use crate::{Binding, DomError, Result, Style};

/// Generational handle to a node in a [`Document`]. Handles to released
/// nodes never alias newer nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) style: Style,
    /// Raw markup injected verbatim ahead of the element's children.
    pub(crate) inner_html: Option<String>,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) children: Vec<ElementId>,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Record {
    data: NodeData,
    parent: Option<ElementId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    record: Option<Record>,
}

/// Arena-backed element tree with a `<head>` and a `<body>`.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: ElementId,
    body: ElementId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: ElementId {
                index: 0,
                generation: 0,
            },
            body: ElementId {
                index: 0,
                generation: 0,
            },
        };
        doc.head = doc.create_element("head");
        doc.body = doc.create_element("body");
        doc
    }

    pub fn head(&self) -> ElementId {
        self.head
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    fn insert(&mut self, data: NodeData) -> ElementId {
        let record = Record { data, parent: None };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.record = Some(record);
            ElementId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                record: Some(record),
            });
            ElementId {
                index,
                generation: 0,
            }
        }
    }

    fn record(&self, id: ElementId) -> Option<&Record> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.record.as_ref())
    }

    fn record_mut(&mut self, id: ElementId) -> Option<&mut Record> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.record.as_mut())
    }

    pub(crate) fn data(&self, id: ElementId) -> Option<&NodeData> {
        self.record(id).map(|r| &r.data)
    }

    fn element(&self, id: ElementId) -> Result<&ElementData> {
        match self.record(id) {
            Some(Record {
                data: NodeData::Element(el),
                ..
            }) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::Stale(id)),
        }
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut ElementData> {
        match self.record_mut(id) {
            Some(Record {
                data: NodeData::Element(el),
                ..
            }) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::Stale(id)),
        }
    }

    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.insert(NodeData::Element(ElementData {
            tag: tag.to_string(),
            attributes: Vec::new(),
            style: Style::new(),
            inner_html: None,
            bindings: Vec::new(),
            children: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> ElementId {
        self.insert(NodeData::Text(text.to_string()))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.record(id).is_some()
    }

    pub fn is_element(&self, id: ElementId) -> bool {
        self.element(id).is_ok()
    }

    /// Tag name of an element; `None` for text nodes and stale ids.
    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.element(id).ok().map(|el| el.tag.as_str())
    }

    /// Data of a text node.
    pub fn text(&self, id: ElementId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.record(id).and_then(|r| r.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.element(id)
            .map(|el| el.children.as_slice())
            .unwrap_or(&[])
    }

    /// True when `ancestor` is `id` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Whether the node is attached under `<body>` or `<head>`.
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.is_inclusive_ancestor(self.body, id) || self.is_inclusive_ancestor(self.head, id)
    }

    /// Append `child` to `parent`, moving it out of its current parent first.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.element(parent)?;
        if !self.contains(child) {
            return Err(DomError::Stale(child));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Hierarchy { parent, child });
        }
        self.detach(child);
        self.element_mut(parent)?.children.push(child);
        if let Some(record) = self.record_mut(child) {
            record.parent = Some(parent);
        }
        Ok(())
    }

    /// Detach `child` from `parent`. The node stays alive and can be
    /// re-inserted.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        let el = self.element_mut(parent)?;
        let before = el.children.len();
        el.children.retain(|c| *c != child);
        if el.children.len() != before {
            if let Some(record) = self.record_mut(child) {
                record.parent = None;
            }
        }
        Ok(())
    }

    /// Detach a node from wherever it is attached.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(parent) = self.parent(id) {
            let _ = self.remove_child(parent, id);
        }
    }

    /// Detach every child of `id`. Children stay alive, so holders of their
    /// ids can attach them elsewhere later.
    pub fn clear_children(&mut self, id: ElementId) -> Result<()> {
        let children = std::mem::take(&mut self.element_mut(id)?.children);
        for child in children {
            if let Some(record) = self.record_mut(child) {
                record.parent = None;
            }
        }
        Ok(())
    }

    /// Detach `id` and free it together with its whole subtree.
    pub fn release(&mut self, id: ElementId) {
        if !self.contains(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        let mut freed = 0usize;
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(record) = slot.record.take() {
                if let NodeData::Element(el) = record.data {
                    stack.extend(el.children);
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                freed += 1;
            }
        }
        trace!(freed, "released subtree");
    }

    /// Release every child of `id`.
    pub fn release_children(&mut self, id: ElementId) -> Result<()> {
        let children = self.element(id)?.children.clone();
        for child in children {
            self.release(child);
        }
        Ok(())
    }

    /// Number of live nodes in the arena, attached or not.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.record.is_some()).count()
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let attrs = &mut self.element_mut(id)?.attributes;
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => attrs.push((name.to_string(), value)),
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: ElementId, name: &str) -> Result<()> {
        self.element_mut(id)?.attributes.retain(|(n, _)| n != name);
        Ok(())
    }

    /// Boolean attribute: present with an empty value when `on`, absent otherwise.
    pub fn set_flag(&mut self, id: ElementId, name: &str, on: bool) -> Result<()> {
        if on {
            self.set_attribute(id, name, "")
        } else {
            self.remove_attribute(id, name)
        }
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id)
            .ok()?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, id: ElementId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_style(&mut self, id: ElementId, property: &str, value: impl Into<String>) -> Result<()> {
        self.element_mut(id)?.style.set(property, value);
        Ok(())
    }

    pub fn remove_style(&mut self, id: ElementId, property: &str) -> Result<()> {
        self.element_mut(id)?.style.remove(property);
        Ok(())
    }

    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        self.element(id).ok()?.style.get(property)
    }

    pub fn styles(&self, id: ElementId) -> Option<&Style> {
        self.element(id).ok().map(|el| &el.style)
    }

    /// Replace all children with a single text node.
    pub fn set_text_content(&mut self, id: ElementId, text: &str) -> Result<()> {
        self.release_children(id)?;
        self.element_mut(id)?.inner_html = None;
        let node = self.create_text(text);
        self.append_child(id, node)
    }

    /// Concatenated text of the node and its descendants. Raw markup is not
    /// parsed and does not contribute.
    pub fn text_content(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: ElementId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Element(el)) => {
                for child in &el.children {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    /// Replace all children with raw markup, stored verbatim.
    pub fn set_inner_html(&mut self, id: ElementId, html: &str) -> Result<()> {
        self.release_children(id)?;
        self.element_mut(id)?.inner_html = Some(html.to_string());
        Ok(())
    }

    pub fn inner_html(&self, id: ElementId) -> Option<&str> {
        self.element(id).ok()?.inner_html.as_deref()
    }

    pub fn add_binding(&mut self, id: ElementId, binding: Binding) -> Result<()> {
        self.element_mut(id)?.bindings.push(binding);
        Ok(())
    }

    pub fn bindings(&self, id: ElementId) -> &[Binding] {
        self.element(id)
            .map(|el| el.bindings.as_slice())
            .unwrap_or(&[])
    }

    /// Depth-first search below `<html>` for an element with the given `id`
    /// attribute.
    pub fn find_by_id(&self, element_id: &str) -> Option<ElementId> {
        let mut stack = vec![self.body, self.head];
        while let Some(current) = stack.pop() {
            if self.attribute(current, "id") == Some(element_id) {
                return Some(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        None
    }

    /// Locate the mount point with the given id, creating a `<div>` at the
    /// end of `<body>` when the page has none.
    pub fn mount_point(&mut self, element_id: &str) -> Result<ElementId> {
        if let Some(existing) = self.find_by_id(element_id) {
            return Ok(existing);
        }
        let host = self.create_element("div");
        self.set_attribute(host, "id", element_id)?;
        self.append_child(self.body, host)?;
        Ok(host)
    }
}
