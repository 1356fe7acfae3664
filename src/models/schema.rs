//! Document schema
//!
//! The schema is a closed table: every node type has one `NodeSpec` describing
//! its group, its content model and which marks its inline content may carry.
//! `Schema::check` validates a whole tree against that table and is called at
//! every construction and mutation boundary (deserialization, step application).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::SchemaViolation;
use super::marks::MarkType;
use super::node::{Node, NodeAttrs};

/// Closed set of node kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Doc,
    Paragraph,
    Heading,
    CodeBlock,
    Blockquote,
    HorizontalRule,
    BulletList,
    OrderedList,
    ListItem,
    Text,
    HardBreak,
}

impl NodeType {
    pub const ALL: [NodeType; 11] = [
        NodeType::Doc,
        NodeType::Paragraph,
        NodeType::Heading,
        NodeType::CodeBlock,
        NodeType::Blockquote,
        NodeType::HorizontalRule,
        NodeType::BulletList,
        NodeType::OrderedList,
        NodeType::ListItem,
        NodeType::Text,
        NodeType::HardBreak,
    ];

    /// Name used in the serialized document
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Doc => "doc",
            NodeType::Paragraph => "paragraph",
            NodeType::Heading => "heading",
            NodeType::CodeBlock => "code_block",
            NodeType::Blockquote => "blockquote",
            NodeType::HorizontalRule => "horizontal_rule",
            NodeType::BulletList => "bullet_list",
            NodeType::OrderedList => "ordered_list",
            NodeType::ListItem => "list_item",
            NodeType::Text => "text",
            NodeType::HardBreak => "hard_break",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        NodeType::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn spec(self) -> &'static NodeSpec {
        &NODE_SPECS[self as usize]
    }

    pub fn is_textblock(self) -> bool {
        self.spec().textblock
    }

    pub fn is_inline(self) -> bool {
        self.spec().group == Some(Group::Inline)
    }

    pub fn is_block(self) -> bool {
        self.spec().group == Some(Group::Block)
    }

    pub fn is_leaf(self) -> bool {
        matches!(self.spec().content, ContentModel::Leaf)
    }

    pub fn is_list(self) -> bool {
        matches!(self, NodeType::BulletList | NodeType::OrderedList)
    }

    /// Attributes a freshly created node of this type gets
    pub fn default_attrs(self) -> NodeAttrs {
        match self {
            NodeType::Heading => NodeAttrs::Heading { level: 1 },
            NodeType::OrderedList => NodeAttrs::OrderedList { order: 1 },
            _ => NodeAttrs::None,
        }
    }

    /// Whether `attrs` is a legal attribute value for this type
    pub fn accepts_attrs(self, attrs: &NodeAttrs) -> bool {
        match (self, attrs) {
            (NodeType::Heading, NodeAttrs::Heading { level }) => (1..=6).contains(level),
            (NodeType::OrderedList, NodeAttrs::OrderedList { .. }) => true,
            (NodeType::Heading, _) | (NodeType::OrderedList, _) => false,
            (_, NodeAttrs::None) => true,
            _ => false,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Content model table
// ============================================================================

/// Node groups referenced by content expressions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Group {
    Block,
    Inline,
}

/// What a content term accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Match {
    Group(Group),
    Type(NodeType),
}

impl Match {
    pub fn accepts(self, node_type: NodeType) -> bool {
        match self {
            Match::Group(group) => node_type.spec().group == Some(group),
            Match::Type(t) => t == node_type,
        }
    }
}

/// One element of a content sequence with its cardinality
#[derive(Clone, Copy, Debug)]
pub struct Term {
    pub matches: Match,
    pub min: usize,
    pub max: Option<usize>,
}

impl Term {
    const fn any(matches: Match) -> Self {
        Self { matches, min: 0, max: None }
    }

    const fn at_least_one(matches: Match) -> Self {
        Self { matches, min: 1, max: None }
    }

    const fn exactly_one(matches: Match) -> Self {
        Self { matches, min: 1, max: Some(1) }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ContentModel {
    /// No children at all (text, hard_break, horizontal_rule)
    Leaf,
    /// Children must match the terms in order
    Sequence(&'static [Term]),
}

/// Which marks the inline content of a node may carry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkRule {
    All,
    None,
}

#[derive(Clone, Copy, Debug)]
pub struct NodeSpec {
    pub node_type: NodeType,
    pub group: Option<Group>,
    pub content: ContentModel,
    pub marks: MarkRule,
    pub textblock: bool,
}

const BLOCK_PLUS: &[Term] = &[Term::at_least_one(Match::Group(Group::Block))];
const INLINE_STAR: &[Term] = &[Term::any(Match::Group(Group::Inline))];
const TEXT_STAR: &[Term] = &[Term::any(Match::Type(NodeType::Text))];
const LIST_ITEM_PLUS: &[Term] = &[Term::at_least_one(Match::Type(NodeType::ListItem))];
const PARAGRAPH_BLOCK_STAR: &[Term] = &[
    Term::exactly_one(Match::Type(NodeType::Paragraph)),
    Term::any(Match::Group(Group::Block)),
];

const fn spec(
    node_type: NodeType,
    group: Option<Group>,
    content: ContentModel,
    marks: MarkRule,
    textblock: bool,
) -> NodeSpec {
    NodeSpec { node_type, group, content, marks, textblock }
}

/// Indexed by `NodeType as usize`
static NODE_SPECS: [NodeSpec; 11] = [
    spec(NodeType::Doc, None, ContentModel::Sequence(BLOCK_PLUS), MarkRule::None, false),
    spec(NodeType::Paragraph, Some(Group::Block), ContentModel::Sequence(INLINE_STAR), MarkRule::All, true),
    spec(NodeType::Heading, Some(Group::Block), ContentModel::Sequence(INLINE_STAR), MarkRule::All, true),
    spec(NodeType::CodeBlock, Some(Group::Block), ContentModel::Sequence(TEXT_STAR), MarkRule::None, true),
    spec(NodeType::Blockquote, Some(Group::Block), ContentModel::Sequence(BLOCK_PLUS), MarkRule::None, false),
    spec(NodeType::HorizontalRule, Some(Group::Block), ContentModel::Leaf, MarkRule::None, false),
    spec(NodeType::BulletList, Some(Group::Block), ContentModel::Sequence(LIST_ITEM_PLUS), MarkRule::None, false),
    spec(NodeType::OrderedList, Some(Group::Block), ContentModel::Sequence(LIST_ITEM_PLUS), MarkRule::None, false),
    spec(NodeType::ListItem, None, ContentModel::Sequence(PARAGRAPH_BLOCK_STAR), MarkRule::None, false),
    spec(NodeType::Text, Some(Group::Inline), ContentModel::Leaf, MarkRule::None, false),
    spec(NodeType::HardBreak, Some(Group::Inline), ContentModel::Leaf, MarkRule::None, false),
];

/// Greedy match of `children` against a term sequence
fn matches_sequence(terms: &[Term], children: &[Node]) -> bool {
    let mut i = 0;
    for term in terms {
        let mut count = 0;
        while i < children.len()
            && term.max.map_or(true, |max| count < max)
            && term.matches.accepts(children[i].node_type())
        {
            i += 1;
            count += 1;
        }
        if count < term.min {
            return false;
        }
    }
    i == children.len()
}

// ============================================================================
// Schema
// ============================================================================

/// The document schema: basic rich-text nodes extended with lists
///
/// Passed explicitly through the editor state rather than registered globally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Schema;

impl Schema {
    pub fn new() -> Self {
        Schema
    }

    pub fn top_node_type(&self) -> NodeType {
        NodeType::Doc
    }

    /// Textblock type used for new and split blocks
    pub fn default_textblock(&self) -> NodeType {
        NodeType::Paragraph
    }

    pub fn spec(&self, node_type: NodeType) -> &'static NodeSpec {
        node_type.spec()
    }

    /// Whether inline content of `parent` may carry `mark`
    pub fn allows_mark(&self, parent: NodeType, _mark: MarkType) -> bool {
        parent.spec().marks == MarkRule::All
    }

    /// Whether `children` is valid content for `parent`
    pub fn valid_content(&self, parent: NodeType, children: &[Node]) -> bool {
        match parent.spec().content {
            ContentModel::Leaf => children.is_empty(),
            ContentModel::Sequence(terms) => matches_sequence(terms, children),
        }
    }

    /// An empty, schema-valid document: `doc(paragraph())`
    pub fn empty_document(&self) -> Node {
        Node::new(
            self.top_node_type(),
            NodeAttrs::None,
            vec![Node::new(self.default_textblock(), NodeAttrs::None, Vec::new())],
        )
    }

    /// Validate a document tree, including the root type
    pub fn check_document(&self, doc: &Node) -> Result<(), SchemaViolation> {
        if doc.node_type() != self.top_node_type() {
            return Err(SchemaViolation::InvalidRoot(doc.node_type()));
        }
        self.check(doc)
    }

    /// Validate a node and everything below it
    pub fn check(&self, node: &Node) -> Result<(), SchemaViolation> {
        let node_type = node.node_type();
        if !node_type.accepts_attrs(node.attrs()) {
            return Err(SchemaViolation::InvalidAttrs(node_type));
        }
        if node.is_text() {
            return match node.as_text() {
                Some(text) if !text.is_empty() => Ok(()),
                _ => Err(SchemaViolation::EmptyText),
            };
        }
        if !node_type.is_inline() && !node.marks().is_empty() {
            return Err(SchemaViolation::MarkedBlock(node_type));
        }

        let children = node.children();
        if let ContentModel::Leaf = node_type.spec().content {
            if let Some(child) = children.first() {
                return Err(SchemaViolation::DisallowedChild { parent: node_type, child: child.node_type() });
            }
            return Ok(());
        }

        for child in children {
            let child_type = child.node_type();
            let allowed = match node_type.spec().content {
                ContentModel::Sequence(terms) => terms.iter().any(|t| t.matches.accepts(child_type)),
                ContentModel::Leaf => false,
            };
            if !allowed {
                return Err(SchemaViolation::DisallowedChild { parent: node_type, child: child_type });
            }
            for mark in child.marks().iter() {
                if !self.allows_mark(node_type, mark) {
                    return Err(SchemaViolation::DisallowedMark { parent: node_type, mark });
                }
            }
        }
        if !self.valid_content(node_type, children) {
            return Err(SchemaViolation::ContentMismatch(node_type));
        }

        children.iter().try_for_each(|child| self.check(child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::marks::MarkSet;

    #[test]
    fn test_spec_table_is_indexed_by_type() {
        for node_type in NodeType::ALL {
            assert_eq!(node_type.spec().node_type, node_type);
        }
    }

    #[test]
    fn test_empty_document_is_valid() {
        let schema = Schema::new();
        let doc = schema.empty_document();
        assert!(schema.check_document(&doc).is_ok());
        assert_eq!(doc.child_count(), 1);
    }

    #[test]
    fn test_doc_requires_a_block() {
        let schema = Schema::new();
        let doc = Node::doc(vec![]);
        assert_eq!(schema.check(&doc), Err(SchemaViolation::ContentMismatch(NodeType::Doc)));
    }

    #[test]
    fn test_list_item_must_start_with_paragraph() {
        let schema = Schema::new();
        let bad = Node::doc(vec![Node::bullet_list(vec![Node::list_item(vec![Node::heading(
            2,
            vec![Node::text("Title")],
        )])])]);
        assert_eq!(schema.check(&bad), Err(SchemaViolation::ContentMismatch(NodeType::ListItem)));

        let good = Node::doc(vec![Node::bullet_list(vec![Node::list_item(vec![
            Node::paragraph(vec![Node::text("item")]),
            Node::heading(2, vec![Node::text("nested")]),
        ])])]);
        assert!(schema.check(&good).is_ok());
    }

    #[test]
    fn test_code_block_rejects_marks_and_breaks() {
        let schema = Schema::new();
        let marked = Node::doc(vec![Node::code_block(vec![Node::marked_text(
            "let x",
            MarkSet::of(&[MarkType::Bold]),
        )])]);
        assert_eq!(
            schema.check(&marked),
            Err(SchemaViolation::DisallowedMark { parent: NodeType::CodeBlock, mark: MarkType::Bold })
        );

        let with_break = Node::doc(vec![Node::code_block(vec![Node::text("a"), Node::hard_break(), Node::text("b")])]);
        assert_eq!(
            schema.check(&with_break),
            Err(SchemaViolation::DisallowedChild { parent: NodeType::CodeBlock, child: NodeType::HardBreak })
        );
    }

    #[test]
    fn test_heading_level_is_bounded() {
        let schema = Schema::new();
        let doc = Node::doc(vec![Node::heading(7, vec![])]);
        assert_eq!(schema.check(&doc), Err(SchemaViolation::InvalidAttrs(NodeType::Heading)));
    }

    #[test]
    fn test_text_not_allowed_directly_in_doc() {
        let schema = Schema::new();
        let doc = Node::doc(vec![Node::text("loose")]);
        assert_eq!(
            schema.check(&doc),
            Err(SchemaViolation::DisallowedChild { parent: NodeType::Doc, child: NodeType::Text })
        );
    }
}
