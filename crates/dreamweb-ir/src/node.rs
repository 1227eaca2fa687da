use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Closed set of component types the generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Container,
    Row,
    Column,
    Center,
    Stack,
    Spacer,
    Text,
    Heading,
    Button,
    TextField,
    Checkbox,
    Image,
    Link,
    Html,
    Css,
    ApiRequest,
    FetchData,
    TextNode,
}

impl Tag {
    pub const ALL: [Tag; 18] = [
        Tag::Container,
        Tag::Row,
        Tag::Column,
        Tag::Center,
        Tag::Stack,
        Tag::Spacer,
        Tag::Text,
        Tag::Heading,
        Tag::Button,
        Tag::TextField,
        Tag::Checkbox,
        Tag::Image,
        Tag::Link,
        Tag::Html,
        Tag::Css,
        Tag::ApiRequest,
        Tag::FetchData,
        Tag::TextNode,
    ];

    /// Wire name, as found in the `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Container => "Container",
            Tag::Row => "Row",
            Tag::Column => "Column",
            Tag::Center => "Center",
            Tag::Stack => "Stack",
            Tag::Spacer => "Spacer",
            Tag::Text => "Text",
            Tag::Heading => "Heading",
            Tag::Button => "Button",
            Tag::TextField => "TextField",
            Tag::Checkbox => "Checkbox",
            Tag::Image => "Image",
            Tag::Link => "Link",
            Tag::Html => "Html",
            Tag::Css => "Css",
            Tag::ApiRequest => "ApiRequest",
            Tag::FetchData => "FetchData",
            Tag::TextNode => "TextNode",
        }
    }

    /// Case-sensitive lookup of a wire name.
    pub fn from_name(name: &str) -> Option<Tag> {
        Tag::ALL.iter().copied().find(|tag| tag.as_str() == name)
    }

    /// Widget types that never render their own children, even when the
    /// generator supplies some.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            Tag::Button | Tag::TextField | Tag::Checkbox | Tag::Image | Tag::Css
        )
    }

    /// Layout types that materialize as a generic box.
    pub fn is_box(self) -> bool {
        matches!(
            self,
            Tag::Container | Tag::Row | Tag::Column | Tag::Center | Tag::Stack | Tag::Spacer
        )
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` of a node as read off the wire. Unknown names are kept so the
/// renderer can report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTag {
    Known(Tag),
    Unrecognized(String),
}

impl NodeTag {
    pub fn parse(name: &str) -> Self {
        match Tag::from_name(name) {
            Some(tag) => NodeTag::Known(tag),
            None => NodeTag::Unrecognized(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NodeTag::Known(tag) => tag.as_str(),
            NodeTag::Unrecognized(name) => name,
        }
    }
}

/// Opaque handler address assigned by the backend. Strings and integers are
/// both seen in practice; the value is echoed back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(Value);

impl HandlerId {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self {
        HandlerId(Value::String(id.to_string()))
    }
}

impl From<String> for HandlerId {
    fn from(id: String) -> Self {
        HandlerId(Value::String(id))
    }
}

impl From<u64> for HandlerId {
    fn from(id: u64) -> Self {
        HandlerId(Value::from(id))
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// Interaction bindings. Only `click` and `change` are understood; other keys
/// are ignored on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Events {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click: Option<HandlerId>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<HandlerId>,
}

impl Events {
    pub fn is_empty(&self) -> bool {
        self.click.is_none() && self.change.is_none()
    }
}

/// Completion callback ids carried by `ApiRequest` / `FetchData` nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Callbacks {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_success: Option<HandlerId>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_error: Option<HandlerId>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_loading: Option<HandlerId>,
}

impl Callbacks {
    pub fn is_empty(&self) -> bool {
        self.on_success.is_none() && self.on_error.is_none() && self.on_loading.is_none()
    }
}

/// JavaScript-style truthiness, which is how the generator's optional props
/// are meant to be read: `null`, `false`, `0` and `""` count as unset.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Free-form property bag of a node with fail-soft typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(Map<String, Value>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value, with an explicit `null` treated as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Value only when it is truthy.
    pub fn truthy(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| is_truthy(v))
    }

    pub fn is_truthy(&self, key: &str) -> bool {
        self.truthy(key).is_some()
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Props {
    fn from(map: Map<String, Value>) -> Self {
        Props(map)
    }
}

/// One component description. Immutable once handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct Node {
    pub tag: NodeTag,
    pub props: Props,
    pub children: Vec<Node>,
    pub events: Events,
    pub callbacks: Callbacks,
    /// Literal text, only meaningful for `TextNode`.
    pub text: Option<String>,
}

impl Node {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag: NodeTag::Known(tag),
            props: Props::new(),
            children: Vec::new(),
            events: Events::default(),
            callbacks: Callbacks::default(),
            text: None,
        }
    }

    /// A literal text child.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(Tag::TextNode)
        }
    }

    /// A node whose `type` the renderer does not know.
    pub fn unrecognized(name: impl Into<String>) -> Self {
        Self {
            tag: NodeTag::Unrecognized(name.into()),
            ..Self::new(Tag::Container)
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key, value);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn on_click(mut self, handler: impl Into<HandlerId>) -> Self {
        self.events.click = Some(handler.into());
        self
    }

    pub fn on_change(mut self, handler: impl Into<HandlerId>) -> Self {
        self.events.change = Some(handler.into());
        self
    }

    pub fn known_tag(&self) -> Option<Tag> {
        match &self.tag {
            NodeTag::Known(tag) => Some(*tag),
            NodeTag::Unrecognized(_) => None,
        }
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Depth-first count of this node and its descendants.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }
}

/// Wire shape of a node.
#[derive(Serialize, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    props: Option<Props>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Node>>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    events: Option<Events>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    callbacks: Option<Callbacks>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let props = raw.props.unwrap_or_default();
        // Older generators nest callback ids under props.
        let callbacks = match raw.callbacks {
            Some(callbacks) if !callbacks.is_empty() => callbacks,
            _ => props
                .get("callbacks")
                .cloned()
                .and_then(|value| serde_json::from_value(value).ok())
                .unwrap_or_default(),
        };
        Node {
            tag: NodeTag::parse(&raw.kind),
            props,
            children: raw.children.unwrap_or_default(),
            events: raw.events.unwrap_or_default(),
            callbacks,
            text: raw.text,
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let is_text = node.tag == NodeTag::Known(Tag::TextNode);
        RawNode {
            kind: node.tag.name().to_string(),
            props: (!is_text).then_some(node.props),
            children: (!node.children.is_empty()).then_some(node.children),
            events: (!node.events.is_empty()).then_some(node.events),
            callbacks: (!node.callbacks.is_empty()).then_some(node.callbacks),
            text: node.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_tag_round_trips_its_wire_name() {
        for tag in Tag::ALL {
            assert_eq!(Tag::from_name(tag.as_str()), Some(tag));
        }
        assert_eq!(Tag::from_name("button"), None);
    }

    #[test]
    fn unknown_type_is_kept_as_unrecognized() {
        let node = Node::from_value(json!({"type": "Carousel", "props": {}})).expect("parse");
        assert_eq!(node.tag, NodeTag::Unrecognized("Carousel".into()));
        assert_eq!(node.known_tag(), None);
    }

    #[test]
    fn text_node_has_only_text() {
        let node = Node::from_value(json!({"type": "TextNode", "text": "42"})).expect("parse");
        assert_eq!(node.known_tag(), Some(Tag::TextNode));
        assert_eq!(node.text.as_deref(), Some("42"));
        assert!(node.props.is_empty());

        let back = serde_json::to_value(&node).expect("serialize");
        assert_eq!(back, json!({"type": "TextNode", "text": "42"}));
    }

    #[test]
    fn null_children_and_events_are_tolerated() {
        let node = Node::from_value(json!({
            "type": "Column",
            "props": {"spacing": 4},
            "children": null,
            "events": null
        }))
        .expect("parse");
        assert!(node.children.is_empty());
        assert!(node.events.is_empty());
    }

    #[test]
    fn handler_ids_accept_strings_and_integers() {
        let node = Node::from_value(json!({
            "type": "Button",
            "props": {"text": "Go"},
            "events": {"click": "on_click_1", "change": 77, "hover": "ignored"}
        }))
        .expect("parse");
        assert_eq!(node.events.click, Some(HandlerId::from("on_click_1")));
        assert_eq!(node.events.change, Some(HandlerId::from(77u64)));
        assert_eq!(node.events.change.as_ref().map(|h| h.to_string()), Some("77".into()));
    }

    #[test]
    fn callbacks_fall_back_to_props() {
        let top = Node::from_value(json!({
            "type": "ApiRequest",
            "props": {"url": "/a"},
            "callbacks": {"on_success": 1}
        }))
        .expect("parse");
        assert_eq!(top.callbacks.on_success, Some(HandlerId::from(1u64)));

        let nested = Node::from_value(json!({
            "type": "FetchData",
            "props": {"url": "/b", "callbacks": {"on_error": "err"}}
        }))
        .expect("parse");
        assert_eq!(nested.callbacks.on_error, Some(HandlerId::from("err")));
        assert_eq!(nested.callbacks.on_success, None);
    }

    #[test]
    fn truthiness_matches_generator_conventions() {
        let props: Props = serde_json::from_value(json!({
            "zero": 0, "empty": "", "null": null, "no": false,
            "one": 1, "text": "x", "obj": {}
        }))
        .expect("props");
        for key in ["zero", "empty", "null", "no", "missing"] {
            assert!(!props.is_truthy(key), "{key} should be falsy");
        }
        for key in ["one", "text", "obj"] {
            assert!(props.is_truthy(key), "{key} should be truthy");
        }
        assert!(props.get("null").is_none());
        assert_eq!(props.get("zero"), Some(&json!(0)));
    }

    #[test]
    fn builder_produces_wire_shape() {
        let node = Node::new(Tag::Row)
            .with_prop("spacing", 8)
            .with_child(Node::text("hi"))
            .on_click("h1");
        let value = serde_json::to_value(&node).expect("serialize");
        assert_eq!(
            value,
            json!({
                "type": "Row",
                "props": {"spacing": 8},
                "children": [{"type": "TextNode", "text": "hi"}],
                "events": {"click": "h1"}
            })
        );
        assert_eq!(node.count(), 2);
    }
}
