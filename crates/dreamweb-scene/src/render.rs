//! Node renderer.
//!
//! Walks a component tree depth-first and builds the matching element
//! subtree. Every render discards the previous subtree; nothing is diffed.
//! Unknown component types are logged and replaced with an empty `div`.

use dreamweb_dom::{Binding, Document, ElementId};
use dreamweb_ir::{Node, NodeTag, Props, Tag};
use tracing::warn;

use crate::api::{self, ApiClient};
use crate::bridge::attach_events;
use crate::notify::NotificationBus;
use crate::style::{self, value_text};

/// Builds elements into a document. Borrowed for the length of one pass.
pub struct Renderer<'a> {
    doc: &'a mut Document,
    api: &'a mut ApiClient,
    bus: &'a NotificationBus,
    widgets: Vec<ElementId>,
}

impl<'a> Renderer<'a> {
    pub fn new(doc: &'a mut Document, api: &'a mut ApiClient, bus: &'a NotificationBus) -> Self {
        Self {
            doc,
            api,
            bus,
            widgets: Vec::new(),
        }
    }

    /// Empty `root`, build `tree` and attach it. Returns the new top element.
    pub fn render(&mut self, root: ElementId, tree: Option<&Node>) -> dreamweb_dom::Result<ElementId> {
        self.doc.release_children(root)?;
        let element = self.create_element(tree)?;
        self.doc.append_child(root, element)?;
        Ok(element)
    }

    /// Tracking elements of the API widgets mounted during this pass.
    pub fn mounted_widgets(&self) -> &[ElementId] {
        &self.widgets
    }

    /// Build one node and its subtree, detached. An absent node yields an
    /// empty text node.
    pub fn create_element(&mut self, node: Option<&Node>) -> dreamweb_dom::Result<ElementId> {
        let Some(node) = node else {
            return Ok(self.doc.create_text(""));
        };

        let element = match &node.tag {
            NodeTag::Known(Tag::TextNode) => {
                return Ok(self.doc.create_text(node.text.as_deref().unwrap_or("")));
            }
            NodeTag::Known(tag) => self.build(*tag, node)?,
            NodeTag::Unrecognized(name) => {
                warn!(component = %name, "unknown component type");
                self.doc.create_element("div")
            }
        };

        let leaf = node.known_tag().is_some_and(Tag::is_leaf);
        if !leaf {
            for child in &node.children {
                let child_element = self.create_element(Some(child))?;
                self.doc.append_child(element, child_element)?;
            }
        }

        attach_events(self.doc, element, &node.events)?;
        Ok(element)
    }

    fn build(&mut self, tag: Tag, node: &Node) -> dreamweb_dom::Result<ElementId> {
        let props = &node.props;
        match tag {
            Tag::Container => {
                let el = self.doc.create_element("div");
                self.container_styles(el, props)?;
                Ok(el)
            }
            Tag::Row => {
                let el = self.doc.create_element("div");
                self.line_styles(el, props, "row")?;
                let wrap = if props.is_truthy("wrap") { "wrap" } else { "nowrap" };
                self.doc.set_style(el, "flex-wrap", wrap)?;
                Ok(el)
            }
            Tag::Column => {
                let el = self.doc.create_element("div");
                self.line_styles(el, props, "column")?;
                Ok(el)
            }
            Tag::Center => {
                let el = self.doc.create_element("div");
                self.set_styles(
                    el,
                    &[
                        ("display", "flex"),
                        ("align-items", "center"),
                        ("justify-content", "center"),
                        ("width", "100%"),
                        ("height", "100%"),
                    ],
                )?;
                Ok(el)
            }
            Tag::Stack => {
                let el = self.doc.create_element("div");
                self.set_styles(
                    el,
                    &[("position", "relative"), ("width", "100%"), ("height", "100%")],
                )?;
                Ok(el)
            }
            Tag::Spacer => {
                let el = self.doc.create_element("div");
                let flex = match props.truthy("size") {
                    Some(size) => format!("0 0 {}px", value_text(size)),
                    None => "1".to_string(),
                };
                self.doc.set_style(el, "flex", flex)?;
                Ok(el)
            }
            Tag::Text => {
                let el = self.doc.create_element("span");
                self.text_styles(el, props)?;
                self.doc.set_text_content(el, &text_prop(props, "text"))?;
                Ok(el)
            }
            Tag::Heading => {
                // h1 through h6 only; anything else falls back to h1.
                let level = props
                    .truthy("level")
                    .map(value_text)
                    .and_then(|level| level.parse::<u8>().ok())
                    .filter(|level| (1..=6).contains(level))
                    .unwrap_or(1);
                let el = self.doc.create_element(&format!("h{level}"));
                self.text_styles(el, props)?;
                self.doc.set_text_content(el, &text_prop(props, "text"))?;
                Ok(el)
            }
            Tag::Button => self.button(props),
            Tag::TextField => self.text_field(props),
            Tag::Checkbox => self.checkbox(props),
            Tag::Image => self.image(props),
            Tag::Link => self.link(props),
            Tag::Html => {
                let el = self.doc.create_element("div");
                self.doc.set_inner_html(el, &text_prop(props, "html"))?;
                Ok(el)
            }
            Tag::Css => {
                let el = self.doc.create_element("style");
                self.doc.set_text_content(el, &text_prop(props, "css"))?;
                Ok(el)
            }
            Tag::ApiRequest | Tag::FetchData => {
                let el = api::mount_widget(self.doc, self.api, self.bus, node)?;
                self.widgets.push(el);
                Ok(el)
            }
            Tag::TextNode => Ok(self.doc.create_text(node.text.as_deref().unwrap_or(""))),
        }
    }

    fn set_styles(&mut self, el: ElementId, declarations: &[(&str, &str)]) -> dreamweb_dom::Result<()> {
        for (property, value) in declarations {
            self.doc.set_style(el, property, *value)?;
        }
        Ok(())
    }

    fn container_styles(&mut self, el: ElementId, props: &Props) -> dreamweb_dom::Result<()> {
        if let Some(border) = props.truthy("border").and_then(style::border) {
            self.doc.set_style(el, "border", border)?;
        }
        let direction = props
            .truthy("direction")
            .map(value_text)
            .unwrap_or_else(|| "column".to_string());
        self.doc.set_style(el, "display", "flex")?;
        self.doc.set_style(el, "flex-direction", direction)?;
        self.doc
            .set_style(el, "align-items", style::map_align(props.str("align")))?;
        self.doc
            .set_style(el, "justify-content", style::map_justify(props.str("justify")))?;

        if let Some(width) = props.truthy("width") {
            self.doc.set_style(el, "width", style::parse_size(width))?;
        }
        if let Some(height) = props.truthy("height") {
            self.doc.set_style(el, "height", style::parse_size(height))?;
        }
        if let Some(padding) = props.truthy("padding") {
            self.doc.set_style(el, "padding", style::parse_spacing(padding))?;
        }
        if let Some(margin) = props.truthy("margin") {
            self.doc.set_style(el, "margin", style::parse_spacing(margin))?;
        }
        if let Some(background) = props.truthy("background") {
            self.doc
                .set_style(el, "background", style::parse_color(&value_text(background)))?;
        }
        if let Some(rounded) = props.truthy("rounded") {
            self.doc.set_style(el, "border-radius", style::parse_rounded(rounded))?;
        }
        if let Some(shadow) = props.truthy("shadow") {
            self.doc.set_style(el, "box-shadow", style::parse_shadow(shadow))?;
        }
        Ok(())
    }

    /// Shared by Row and Column.
    fn line_styles(&mut self, el: ElementId, props: &Props, direction: &str) -> dreamweb_dom::Result<()> {
        let gap = props.truthy("spacing").map(value_text).unwrap_or_else(|| "0".into());
        self.doc.set_style(el, "display", "flex")?;
        self.doc.set_style(el, "flex-direction", direction)?;
        self.doc
            .set_style(el, "align-items", style::map_align(props.str("align")))?;
        self.doc
            .set_style(el, "justify-content", style::map_justify(props.str("justify")))?;
        self.doc.set_style(el, "gap", format!("{gap}px"))
    }

    fn text_styles(&mut self, el: ElementId, props: &Props) -> dreamweb_dom::Result<()> {
        if let Some(size) = props.truthy("size") {
            self.doc.set_style(el, "font-size", style::parse_font_size(size))?;
        }
        if let Some(weight) = props.truthy("weight") {
            self.doc.set_style(el, "font-weight", style::parse_font_weight(weight))?;
        }
        if let Some(color) = props.truthy("color") {
            self.doc
                .set_style(el, "color", style::parse_color(&value_text(color)))?;
        }
        if let Some(align) = props.truthy("align") {
            self.doc.set_style(el, "text-align", value_text(align))?;
        }
        if props.is_truthy("italic") {
            self.doc.set_style(el, "font-style", "italic")?;
        }
        if props.is_truthy("underline") {
            self.doc.set_style(el, "text-decoration", "underline")?;
        }
        if let Some(font) = props.truthy("font") {
            self.doc.set_style(el, "font-family", value_text(font))?;
        }
        Ok(())
    }

    fn button(&mut self, props: &Props) -> dreamweb_dom::Result<ElementId> {
        let el = self.doc.create_element("button");
        self.doc.set_text_content(el, &text_prop(props, "text"))?;

        let size = props.str("size");
        let disabled = props.is_truthy("disabled");
        let radius = if props.is_truthy("rounded") { "0.375rem" } else { "0" };
        self.set_styles(
            el,
            &[
                ("padding", style::parse_button_padding(size)),
                ("font-size", style::parse_button_font_size(size)),
                ("border-radius", radius),
                ("border", "none"),
                ("cursor", if disabled { "not-allowed" } else { "pointer" }),
                ("opacity", if disabled { "0.5" } else { "1" }),
                ("font-weight", "500"),
                ("transition", "all 0.2s"),
            ],
        )?;
        for (property, value) in style::button_colors(props.str("color"), props.str("variant")) {
            self.doc.set_style(el, property, value)?;
        }

        if !disabled {
            self.doc.add_binding(el, Binding::HoverLift)?;
        }
        Ok(el)
    }

    fn text_field(&mut self, props: &Props) -> dreamweb_dom::Result<ElementId> {
        let el = self.doc.create_element("input");
        let input_type = props.truthy("type").map(value_text).unwrap_or_else(|| "text".into());
        self.doc.set_attribute(el, "type", input_type)?;
        if let Some(placeholder) = props.truthy("placeholder") {
            self.doc.set_attribute(el, "placeholder", value_text(placeholder))?;
        }
        if let Some(value) = props.truthy("value") {
            self.doc.set_attribute(el, "value", value_text(value))?;
        }
        self.doc.set_flag(el, "disabled", props.is_truthy("disabled"))?;
        self.set_styles(
            el,
            &[
                ("padding", "0.5rem 0.75rem"),
                ("font-size", "1rem"),
                ("border", "1px solid #d1d5db"),
                ("border-radius", "0.375rem"),
                ("outline", "none"),
                ("transition", "all 0.2s"),
            ],
        )?;
        self.doc.add_binding(el, Binding::FocusRing)?;
        Ok(el)
    }

    fn checkbox(&mut self, props: &Props) -> dreamweb_dom::Result<ElementId> {
        let label = self.doc.create_element("label");
        self.set_styles(
            label,
            &[
                ("display", "flex"),
                ("align-items", "center"),
                ("gap", "0.5rem"),
                ("cursor", "pointer"),
            ],
        )?;

        let input = self.doc.create_element("input");
        self.doc.set_attribute(input, "type", "checkbox")?;
        self.doc.set_flag(input, "checked", props.is_truthy("checked"))?;
        self.doc.set_flag(input, "disabled", props.is_truthy("disabled"))?;

        let span = self.doc.create_element("span");
        self.doc.set_text_content(span, &text_prop(props, "label"))?;

        self.doc.append_child(label, input)?;
        self.doc.append_child(label, span)?;
        Ok(label)
    }

    fn image(&mut self, props: &Props) -> dreamweb_dom::Result<ElementId> {
        let el = self.doc.create_element("img");
        self.doc.set_attribute(el, "src", text_prop(props, "src"))?;
        self.doc.set_attribute(el, "alt", text_prop(props, "alt"))?;
        if let Some(width) = props.truthy("width") {
            self.doc.set_style(el, "width", style::parse_size(width))?;
        }
        if let Some(height) = props.truthy("height") {
            self.doc.set_style(el, "height", style::parse_size(height))?;
        }
        if let Some(fit) = props.truthy("fit") {
            self.doc.set_style(el, "object-fit", value_text(fit))?;
        }
        if let Some(rounded) = props.truthy("rounded") {
            self.doc.set_style(el, "border-radius", style::parse_rounded(rounded))?;
        }
        Ok(el)
    }

    fn link(&mut self, props: &Props) -> dreamweb_dom::Result<ElementId> {
        let el = self.doc.create_element("a");
        self.doc.set_attribute(el, "href", text_prop(props, "to"))?;
        self.doc.set_text_content(el, &text_prop(props, "text"))?;
        if let Some(color) = props.get("color") {
            self.doc
                .set_style(el, "color", style::parse_color(&value_text(color)))?;
        }
        let decoration = if props.is_truthy("underline") { "underline" } else { "none" };
        self.doc.set_style(el, "text-decoration", decoration)?;
        Ok(el)
    }
}

fn text_prop(props: &Props, key: &str) -> String {
    props.get(key).map(value_text).unwrap_or_default()
}
