//! Placeholder decorations
//!
//! Decorations are derived view data: they never live in the document and are
//! recomputed from it. The only decoration the editor produces is the
//! empty-document placeholder, which the host renders as a CSS class plus a
//! `data-placeholder` attribute on the first block.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::node::Node;

/// CSS class attached to an empty document
pub const EMPTY_CLASS: &str = "is-editor-empty";

/// Attribute carrying the placeholder text
pub const PLACEHOLDER_ATTR: &str = "data-placeholder";

/// Default placeholder text
pub const DEFAULT_PLACEHOLDER: &str = "Write something...";

/// A node decoration over `from..to`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
    pub class: String,
    pub attrs: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decoration> {
        self.decorations.iter()
    }
}

/// Whether the document has no user content
///
/// True for a document without children, or with exactly one textblock child
/// that has no content.
pub fn is_doc_empty(doc: &Node) -> bool {
    match doc.children() {
        [] => true,
        [only] => only.is_textblock() && only.content_size() == 0,
        _ => false,
    }
}

/// Decorations for `doc`: the placeholder when it is empty, nothing otherwise
pub fn decorate(doc: &Node, placeholder: &str) -> DecorationSet {
    if !is_doc_empty(doc) {
        return DecorationSet::empty();
    }
    let mut attrs = BTreeMap::new();
    attrs.insert(PLACEHOLDER_ATTR.to_string(), placeholder.to_string());
    DecorationSet {
        decorations: vec![Decoration { from: 0, to: doc.content_size(), class: EMPTY_CLASS.to_string(), attrs }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::marks::{MarkSet, MarkType};
    use crate::models::schema::{NodeType, Schema};
    use crate::models::NodeAttrs;

    #[test]
    fn test_empty_document_gets_placeholder() {
        let doc = Schema::new().empty_document();
        let set = decorate(&doc, DEFAULT_PLACEHOLDER);
        assert_eq!(set.len(), 1);
        let deco = set.iter().next().unwrap();
        assert_eq!((deco.from, deco.to), (0, 2));
        assert_eq!(deco.class, "is-editor-empty");
        assert_eq!(deco.attrs.get("data-placeholder").map(String::as_str), Some("Write something..."));
    }

    #[test]
    fn test_childless_document_gets_placeholder() {
        let doc = Node::new(NodeType::Doc, NodeAttrs::None, Vec::new());
        let set = decorate(&doc, "Start typing");
        assert_eq!(set.iter().next().map(|d| (d.from, d.to)), Some((0, 0)));
    }

    #[test]
    fn test_content_removes_placeholder() {
        let doc = Node::doc(vec![Node::paragraph(vec![Node::text("a")])]);
        assert!(decorate(&doc, DEFAULT_PLACEHOLDER).is_empty());

        let two_empty = Node::doc(vec![Node::paragraph(vec![]), Node::paragraph(vec![])]);
        assert!(decorate(&two_empty, DEFAULT_PLACEHOLDER).is_empty());

        let rule = Node::doc(vec![Node::horizontal_rule()]);
        assert!(decorate(&rule, DEFAULT_PLACEHOLDER).is_empty());

        let list = Node::doc(vec![Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![])])])]);
        assert!(decorate(&list, DEFAULT_PLACEHOLDER).is_empty());
    }

    #[test]
    fn test_empty_heading_counts_as_empty() {
        let doc = Node::doc(vec![Node::heading(1, vec![])]);
        assert_eq!(decorate(&doc, DEFAULT_PLACEHOLDER).len(), 1);
        let marked = Node::doc(vec![Node::paragraph(vec![Node::marked_text("", MarkSet::of(&[MarkType::Bold]))])]);
        assert_eq!(decorate(&marked, DEFAULT_PLACEHOLDER).len(), 1);
    }

    #[test]
    fn test_decorate_is_idempotent() {
        let doc = Schema::new().empty_document();
        assert_eq!(decorate(&doc, "x"), decorate(&doc, "x"));
    }
}
