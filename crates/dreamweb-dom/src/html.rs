//! Markup serialization of a [`Document`].

use crate::document::{Document, ElementData, NodeData};
use crate::ElementId;

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

impl Document {
    /// Outer markup of `id`. Stale ids serialize to an empty string.
    pub fn to_html(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    /// Markup of the children of `id`, without the element itself.
    pub fn inner_to_html(&self, id: ElementId) -> String {
        let mut out = String::new();
        if let Some(NodeData::Element(el)) = self.data(id) {
            self.write_children(el, &mut out);
        }
        out
    }

    /// Full page: doctype, head and body.
    pub fn to_page(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n<html>");
        self.write_node(self.head(), false, &mut out);
        self.write_node(self.body(), false, &mut out);
        out.push_str("</html>\n");
        out
    }

    fn write_node(&self, id: ElementId, raw_text: bool, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(text)) if raw_text => out.push_str(text),
            Some(NodeData::Text(text)) => escape_text(text, out),
            Some(NodeData::Element(el)) => self.write_element(el, out),
            None => {}
        }
    }

    fn write_element(&self, el: &ElementData, out: &mut String) {
        out.push('<');
        out.push_str(&el.tag);
        for (name, value) in &el.attributes {
            out.push(' ');
            out.push_str(name);
            if !value.is_empty() {
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
        }
        if !el.style.is_empty() {
            out.push_str(" style=\"");
            escape_attribute(&el.style.to_css(), out);
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&el.tag.as_str()) {
            return;
        }
        self.write_children(el, out);
        out.push_str("</");
        out.push_str(&el.tag);
        out.push('>');
    }

    fn write_children(&self, el: &ElementData, out: &mut String) {
        if let Some(html) = &el.inner_html {
            out.push_str(html);
        }
        let raw_text = RAW_TEXT_ELEMENTS.contains(&el.tag.as_str());
        for child in &el.children {
            self.write_node(*child, raw_text, out);
        }
    }
}
