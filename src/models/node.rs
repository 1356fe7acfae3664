//! Document tree
//!
//! Nodes are immutable. Children live in shared `Arc` slices, so every edit
//! builds a new tree that reuses the untouched subtrees of the old one, and the
//! old tree stays valid (the history keeps referring to it).
//!
//! ## Positions
//!
//! Positions follow the usual rich-text convention: entering or leaving a
//! non-leaf node costs one position, every character of text and every leaf
//! node costs one. A document's content spans `0..=content_size()`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::errors::StepError;
use super::marks::MarkSet;
use super::schema::NodeType;
use crate::utils::{char_len, char_slice};

/// Typed attributes for the node types that carry any
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeAttrs {
    #[default]
    None,
    Heading { level: u8 },
    OrderedList { order: u32 },
}

/// A node in a document tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    node_type: NodeType,
    attrs: NodeAttrs,
    content: Arc<[Node]>,
    text: Option<Arc<str>>,
    marks: MarkSet,
    /// Characters for text nodes, summed child sizes otherwise
    content_size: usize,
}

impl Node {
    /// Create a non-text node; inline children are normalized
    pub fn new(node_type: NodeType, attrs: NodeAttrs, content: Vec<Node>) -> Self {
        let content = normalize_inline(content);
        let content_size = content.iter().map(Node::node_size).sum();
        Self {
            node_type,
            attrs,
            content: content.into(),
            text: None,
            marks: MarkSet::new(),
            content_size,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::marked_text(text, MarkSet::new())
    }

    pub fn marked_text(text: impl Into<String>, marks: MarkSet) -> Self {
        let text: String = text.into();
        let content_size = char_len(&text);
        Self {
            node_type: NodeType::Text,
            attrs: NodeAttrs::None,
            content: Arc::from(Vec::new()),
            text: Some(text.into()),
            marks,
            content_size,
        }
    }

    pub fn leaf(node_type: NodeType) -> Self {
        Self::new(node_type, NodeAttrs::None, Vec::new())
    }

    pub fn doc(content: Vec<Node>) -> Self {
        Self::new(NodeType::Doc, NodeAttrs::None, content)
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Self::new(NodeType::Paragraph, NodeAttrs::None, content)
    }

    pub fn heading(level: u8, content: Vec<Node>) -> Self {
        Self::new(NodeType::Heading, NodeAttrs::Heading { level }, content)
    }

    pub fn code_block(content: Vec<Node>) -> Self {
        Self::new(NodeType::CodeBlock, NodeAttrs::None, content)
    }

    pub fn blockquote(content: Vec<Node>) -> Self {
        Self::new(NodeType::Blockquote, NodeAttrs::None, content)
    }

    pub fn bullet_list(items: Vec<Node>) -> Self {
        Self::new(NodeType::BulletList, NodeAttrs::None, items)
    }

    pub fn ordered_list(items: Vec<Node>) -> Self {
        Self::new(NodeType::OrderedList, NodeAttrs::OrderedList { order: 1 }, items)
    }

    pub fn list_item(content: Vec<Node>) -> Self {
        Self::new(NodeType::ListItem, NodeAttrs::None, content)
    }

    pub fn hard_break() -> Self {
        Self::leaf(NodeType::HardBreak)
    }

    pub fn horizontal_rule() -> Self {
        Self::leaf(NodeType::HorizontalRule)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn attrs(&self) -> &NodeAttrs {
        &self.attrs
    }

    pub fn children(&self) -> &[Node] {
        &self.content
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.content.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.content.last()
    }

    /// Text of a text node
    pub fn as_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type.is_leaf()
    }

    pub fn is_inline(&self) -> bool {
        self.node_type.is_inline()
    }

    pub fn is_textblock(&self) -> bool {
        self.node_type.is_textblock()
    }

    pub fn content_size(&self) -> usize {
        self.content_size
    }

    /// Number of positions this node occupies in its parent
    pub fn node_size(&self) -> usize {
        if self.is_text() {
            self.content_size
        } else if self.is_leaf() {
            1
        } else {
            self.content_size + 2
        }
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        match &self.text {
            Some(text) => text.to_string(),
            None => self.content.iter().map(Node::text_content).collect(),
        }
    }

    /// Offset of child `index` from the start of this node's content
    pub fn child_offset(&self, index: usize) -> usize {
        self.content.iter().take(index).map(Node::node_size).sum()
    }

    // ------------------------------------------------------------------------
    // Derived copies
    // ------------------------------------------------------------------------

    /// Same type and attributes, new children
    pub fn with_content(&self, content: Vec<Node>) -> Node {
        Node::new(self.node_type, self.attrs, content)
    }

    /// Same children, new type and attributes
    pub fn with_type(&self, node_type: NodeType, attrs: NodeAttrs) -> Node {
        let mut node = self.clone();
        node.node_type = node_type;
        node.attrs = attrs;
        node
    }

    pub fn with_marks(&self, marks: MarkSet) -> Node {
        let mut node = self.clone();
        node.marks = marks;
        node
    }

    /// Copy with child `index` replaced
    pub fn replace_child(&self, index: usize, child: Node) -> Node {
        let mut content = self.content.to_vec();
        if let Some(slot) = content.get_mut(index) {
            *slot = child;
        }
        self.with_content(content)
    }

    /// Part of a text node between two character offsets
    pub fn text_slice(&self, from: usize, to: usize) -> Node {
        let text = self.text.as_deref().unwrap_or_default();
        Node::marked_text(char_slice(text, from, to), self.marks.clone())
    }

    /// Copy restricted to the content between two content offsets
    ///
    /// Children only partly inside the range are cut recursively, so the result
    /// keeps the structure of the nodes the range passes through.
    pub fn cut(&self, from: usize, to: usize) -> Node {
        if self.is_text() {
            return self.text_slice(from, to);
        }
        if from == 0 && to >= self.content_size {
            return self.clone();
        }
        let mut result = Vec::new();
        let mut pos = 0;
        for child in self.content.iter() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from {
                if pos >= from && end <= to {
                    result.push(child.clone());
                } else if child.is_text() {
                    result.push(child.text_slice(from.saturating_sub(pos), to.min(end) - pos));
                } else if !child.is_leaf() {
                    let inner_from = from.saturating_sub(pos + 1);
                    let inner_to = to.saturating_sub(pos + 1).min(child.content_size());
                    result.push(child.cut(inner_from, inner_to));
                }
            }
            pos = end;
        }
        self.with_content(result)
    }

    /// Children between two content offsets lying on child boundaries
    pub fn content_between(&self, from: usize, to: usize) -> Vec<Node> {
        self.cut(from, to).content.to_vec()
    }

    // ------------------------------------------------------------------------
    // Positions
    // ------------------------------------------------------------------------

    /// Child index containing content `offset` and the offset where it starts
    fn find_index(&self, offset: usize) -> (usize, usize) {
        let mut cur = 0;
        for (i, child) in self.content.iter().enumerate() {
            let end = cur + child.node_size();
            if end > offset {
                return (i, cur);
            }
            cur = end;
        }
        (self.content.len(), cur)
    }

    /// Resolve a position into its ancestor path
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos<'_>, StepError> {
        if pos > self.content_size {
            return Err(StepError::OutOfRange { pos, size: self.content_size });
        }
        let mut levels = Vec::new();
        let mut node = self;
        let mut start = 0;
        let mut offset = pos;
        let mut text_offset = 0;
        loop {
            let (index, child_start) = node.find_index(offset);
            let rem = offset - child_start;
            levels.push(Level { node, index, start });
            if rem == 0 {
                break;
            }
            let child = &node.content[index];
            if child.is_text() {
                text_offset = rem;
                break;
            }
            if child.is_leaf() {
                break;
            }
            node = child;
            start += child_start + 1;
            offset = rem - 1;
        }
        Ok(ResolvedPos { pos, levels, parent_offset: offset, text_offset })
    }

    /// Node starting directly at `pos`
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        self.resolve(pos).ok().and_then(|rp| rp.node_after())
    }

    /// Visit every descendant overlapping `from..to`
    ///
    /// The callback receives the node and its absolute start position and
    /// returns whether to descend into it.
    pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        self.nodes_between_at(from, to, 0, f);
    }

    fn nodes_between_at<F>(&self, from: usize, to: usize, content_start: usize, f: &mut F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        let mut pos = 0;
        for child in self.content.iter() {
            let end = pos + child.node_size();
            if pos > to || (pos == to && from != to) {
                break;
            }
            if end > from && f(child, content_start + pos) && child.content_size() > 0 && !child.is_text() {
                let inner = pos + 1;
                child.nodes_between_at(
                    from.saturating_sub(inner),
                    to.saturating_sub(inner).min(child.content_size()),
                    content_start + inner,
                    f,
                );
            }
            pos = end;
        }
    }

    /// Textblocks overlapping `from..to` with their start positions
    pub fn textblocks_between(&self, from: usize, to: usize) -> Vec<(usize, &Node)> {
        let mut found = Vec::new();
        collect_textblocks(self, from, to, 0, &mut found);
        found
    }

    /// Content start of the first textblock in document order
    pub fn first_textblock_start(&self) -> Option<usize> {
        self.textblocks_between(0, self.content_size).first().map(|(pos, _)| pos + 1)
    }

    /// Content end of the last textblock in document order
    pub fn last_textblock_end(&self) -> Option<usize> {
        self.textblocks_between(0, self.content_size)
            .last()
            .map(|(pos, node)| pos + 1 + node.content_size())
    }
}

/// Textblock search that shares lifetimes with `self` (closures cannot)
fn collect_textblocks<'a>(node: &'a Node, from: usize, to: usize, content_start: usize, found: &mut Vec<(usize, &'a Node)>) {
    let mut pos = 0;
    for child in node.content.iter() {
        let end = pos + child.node_size();
        if pos > to || (pos == to && from != to) {
            break;
        }
        if end > from || (end == from && from == to && child.is_textblock()) {
            if child.is_textblock() {
                found.push((content_start + pos, child));
            } else if !child.is_leaf() {
                let inner = pos + 1;
                collect_textblocks(
                    child,
                    from.saturating_sub(inner),
                    to.saturating_sub(inner).min(child.content_size()),
                    content_start + inner,
                    found,
                );
            }
        }
        pos = end;
    }
}

/// Drop empty text nodes and merge neighbouring text with equal marks
fn normalize_inline(content: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(content.len());
    for child in content {
        if child.is_text() {
            if child.content_size == 0 {
                continue;
            }
            if let Some(last) = out.last_mut() {
                if last.is_text() && last.marks == child.marks {
                    let merged = format!("{}{}", last.as_text().unwrap_or_default(), child.as_text().unwrap_or_default());
                    *last = Node::marked_text(merged, child.marks.clone());
                    continue;
                }
            }
        }
        out.push(child);
    }
    out
}

// ============================================================================
// Resolved positions
// ============================================================================

#[derive(Clone, Copy, Debug)]
struct Level<'a> {
    node: &'a Node,
    index: usize,
    start: usize,
}

/// A position together with the path of ancestors containing it
#[derive(Clone, Debug)]
pub struct ResolvedPos<'a> {
    pub pos: usize,
    levels: Vec<Level<'a>>,
    parent_offset: usize,
    text_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    /// Depth of the innermost ancestor (0 = document)
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn node(&self, depth: usize) -> &'a Node {
        self.levels[depth].node
    }

    pub fn parent(&self) -> &'a Node {
        self.node(self.depth())
    }

    pub fn doc(&self) -> &'a Node {
        self.node(0)
    }

    /// Index into the ancestor at `depth`
    pub fn index(&self, depth: usize) -> usize {
        self.levels[depth].index
    }

    /// Index after the position at `depth`
    pub fn index_after(&self, depth: usize) -> usize {
        let index = self.index(depth);
        if depth == self.depth() && self.text_offset == 0 {
            index
        } else {
            index + 1
        }
    }

    /// Content start of the ancestor at `depth`
    pub fn start(&self, depth: usize) -> usize {
        self.levels[depth].start
    }

    /// Content end of the ancestor at `depth`
    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position before the ancestor at `depth` (depth >= 1)
    pub fn before(&self, depth: usize) -> usize {
        self.start(depth).saturating_sub(1)
    }

    /// Position after the ancestor at `depth` (depth >= 1)
    pub fn after(&self, depth: usize) -> usize {
        self.end(depth) + 1
    }

    /// Offset into the parent's content
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    /// Offset into the text node the position points into
    pub fn text_offset(&self) -> usize {
        self.text_offset
    }

    /// Node directly after the position, if it starts here
    pub fn node_after(&self) -> Option<&'a Node> {
        if self.text_offset > 0 {
            return None;
        }
        self.parent().child(self.index(self.depth()))
    }

    /// Node directly before the position, if it ends here
    pub fn node_before(&self) -> Option<&'a Node> {
        if self.text_offset > 0 {
            return None;
        }
        let index = self.index(self.depth());
        if index == 0 {
            None
        } else {
            self.parent().child(index - 1)
        }
    }

    /// Marks inherited by text typed at this position
    pub fn marks(&self) -> MarkSet {
        let parent = self.parent();
        let index = self.index(self.depth());
        if self.text_offset > 0 {
            return parent.child(index).map(|n| n.marks().clone()).unwrap_or_default();
        }
        let before = if index > 0 { parent.child(index - 1) } else { None };
        before
            .or_else(|| parent.child(index))
            .filter(|n| n.is_inline())
            .map(|n| n.marks().clone())
            .unwrap_or_default()
    }

    /// Deepest depth whose node also contains `pos`
    pub fn shared_depth(&self, pos: usize) -> usize {
        (0..=self.depth())
            .rev()
            .find(|&d| self.start(d) <= pos && self.end(d) >= pos)
            .unwrap_or(0)
    }

    /// Deepest ancestor depth that is a textblock
    pub fn textblock_depth(&self) -> Option<usize> {
        (0..=self.depth()).rev().find(|&d| self.node(d).is_textblock())
    }
}
