//! JSON representation of documents
//!
//! Documents are stored as the nested JSON shape used by rich-text editors on
//! the web:
//!
//! ```json
//! {"type":"doc","content":[{"type":"paragraph","content":[
//!   {"type":"text","text":"Hello","marks":[{"type":"strong"}]}]}]}
//! ```
//!
//! `Node` implements `Serialize`/`Deserialize` through this shape. Deserializing
//! with serde alone only checks names and attributes; `deserialize` below also
//! validates the tree against the schema.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::ParseError;
use super::marks::{MarkSet, MarkType};
use super::node::{Node, NodeAttrs};
use super::schema::{NodeType, Schema};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct MarkJson {
    #[serde(rename = "type")]
    mark_type: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
struct AttrsJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct NodeJson {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attrs: Option<AttrsJson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    content: Vec<NodeJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    marks: Vec<MarkJson>,
}

impl From<&Node> for NodeJson {
    fn from(node: &Node) -> Self {
        let attrs = match *node.attrs() {
            NodeAttrs::None => None,
            NodeAttrs::Heading { level } => Some(AttrsJson { level: Some(level), order: None }),
            NodeAttrs::OrderedList { order } => Some(AttrsJson { level: None, order: Some(order) }),
        };
        NodeJson {
            node_type: node.node_type().name().to_string(),
            attrs,
            content: node.children().iter().map(NodeJson::from).collect(),
            text: node.as_text().map(str::to_string),
            marks: node
                .marks()
                .iter()
                .map(|m| MarkJson { mark_type: m.name().to_string() })
                .collect(),
        }
    }
}

impl TryFrom<NodeJson> for Node {
    type Error = ParseError;

    fn try_from(json: NodeJson) -> Result<Self, Self::Error> {
        let node_type =
            NodeType::from_name(&json.node_type).ok_or_else(|| ParseError::UnknownNodeType(json.node_type.clone()))?;

        let marks = json
            .marks
            .iter()
            .map(|m| MarkType::from_name(&m.mark_type).ok_or_else(|| ParseError::UnknownMarkType(m.mark_type.clone())))
            .collect::<Result<MarkSet, _>>()?;

        if node_type == NodeType::Text {
            let text = json
                .text
                .ok_or_else(|| ParseError::Malformed("text node without text".to_string()))?;
            if !json.content.is_empty() {
                return Err(ParseError::Malformed("text node with content".to_string()));
            }
            return Ok(Node::marked_text(text, marks));
        }
        if json.text.is_some() {
            return Err(ParseError::Malformed(format!("{} node with text", node_type)));
        }

        let attrs = attrs_from_json(node_type, json.attrs.unwrap_or_default());
        let content = json
            .content
            .into_iter()
            .map(Node::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let node = Node::new(node_type, attrs, content);
        Ok(if marks.is_empty() { node } else { node.with_marks(marks) })
    }
}

/// Fill in type defaults for missing attributes
fn attrs_from_json(node_type: NodeType, attrs: AttrsJson) -> NodeAttrs {
    match node_type.default_attrs() {
        NodeAttrs::Heading { level } => NodeAttrs::Heading { level: attrs.level.unwrap_or(level) },
        NodeAttrs::OrderedList { order } => NodeAttrs::OrderedList { order: attrs.order.unwrap_or(order) },
        NodeAttrs::None => NodeAttrs::None,
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeJson::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = NodeJson::deserialize(deserializer)?;
        Node::try_from(json).map_err(D::Error::custom)
    }
}

// ============================================================================
// Document codec
// ============================================================================

/// Serialize a document to its stored JSON form
pub fn serialize(doc: &Node) -> String {
    serde_json::to_string(&NodeJson::from(doc)).unwrap_or_default()
}

/// Parse stored JSON into a schema-valid document
pub fn deserialize(schema: &Schema, content: &str) -> Result<Node, ParseError> {
    let json: NodeJson = serde_json::from_str(content).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let doc = Node::try_from(json)?;
    schema.check_document(&doc)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::SchemaViolation;

    fn rich_document() -> Node {
        Node::doc(vec![
            Node::heading(2, vec![Node::text("Title")]),
            Node::paragraph(vec![
                Node::text("plain "),
                Node::marked_text("bold", MarkSet::of(&[MarkType::Bold])),
                Node::hard_break(),
                Node::marked_text("both", MarkSet::of(&[MarkType::Italic, MarkType::Bold])),
            ]),
            Node::ordered_list(vec![Node::list_item(vec![Node::paragraph(vec![Node::text("one")])])]),
            Node::code_block(vec![Node::text("fn main() {}")]),
            Node::horizontal_rule(),
        ])
    }

    #[test]
    fn test_round_trip() {
        let schema = Schema::new();
        let doc = rich_document();
        let json = serialize(&doc);
        assert_eq!(deserialize(&schema, &json).unwrap(), doc);
    }

    #[test]
    fn test_serialized_shape() {
        let doc = Node::doc(vec![Node::paragraph(vec![Node::marked_text("Hi", MarkSet::of(&[MarkType::Bold]))])]);
        assert_eq!(
            serialize(&doc),
            r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"Hi","marks":[{"type":"strong"}]}]}]}"#
        );
    }

    #[test]
    fn test_malformed_json() {
        let schema = Schema::new();
        assert!(matches!(deserialize(&schema, "{not json"), Err(ParseError::InvalidJson(_))));
    }

    #[test]
    fn test_unknown_types() {
        let schema = Schema::new();
        let unknown_node = r#"{"type":"doc","content":[{"type":"table"}]}"#;
        assert_eq!(deserialize(&schema, unknown_node), Err(ParseError::UnknownNodeType("table".to_string())));

        let unknown_mark =
            r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"x","marks":[{"type":"link"}]}]}]}"#;
        assert_eq!(deserialize(&schema, unknown_mark), Err(ParseError::UnknownMarkType("link".to_string())));
    }

    #[test]
    fn test_schema_incompatible_content() {
        let schema = Schema::new();
        let loose_text = r#"{"type":"doc","content":[{"type":"text","text":"x"}]}"#;
        assert_eq!(
            deserialize(&schema, loose_text),
            Err(ParseError::Schema(SchemaViolation::DisallowedChild {
                parent: NodeType::Doc,
                child: NodeType::Text
            }))
        );

        let wrong_root = r#"{"type":"paragraph"}"#;
        assert_eq!(
            deserialize(&schema, wrong_root),
            Err(ParseError::Schema(SchemaViolation::InvalidRoot(NodeType::Paragraph)))
        );
    }

    #[test]
    fn test_heading_level_defaults() {
        let schema = Schema::new();
        let doc = deserialize(&schema, r#"{"type":"doc","content":[{"type":"heading"}]}"#).unwrap();
        assert_eq!(doc.child(0).map(|n| *n.attrs()), Some(NodeAttrs::Heading { level: 1 }));
    }
}
