//! Selection model
//!
//! A selection is an anchor (where it started) and a head (where it ends, the
//! side that moves). Both are document positions.

use serde::{Deserialize, Serialize};

use super::node::Node;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Collapsed selection at `pos`
    pub fn cursor(pos: usize) -> Self {
        Self { anchor: pos, head: pos }
    }

    /// Cursor at the start of the first textblock (or 0)
    pub fn at_start(doc: &Node) -> Self {
        Self::cursor(doc.first_textblock_start().unwrap_or(0))
    }

    /// Cursor at the end of the last textblock (or 0)
    pub fn at_end(doc: &Node) -> Self {
        Self::cursor(doc.last_textblock_end().unwrap_or(0))
    }

    /// The whole document
    pub fn all(doc: &Node) -> Self {
        Self::new(0, doc.content_size())
    }

    /// Cursor at `pos` if that is inside a textblock, else at the closest
    /// textblock position after it (falling back to the last one before it)
    pub fn near(doc: &Node, pos: usize) -> Self {
        let pos = pos.min(doc.content_size());
        let inside = doc.resolve(pos).map(|rp| rp.parent().is_textblock()).unwrap_or(false);
        if inside {
            return Self::cursor(pos);
        }
        let after = doc
            .textblocks_between(pos, doc.content_size())
            .into_iter()
            .map(|(start, _)| start + 1)
            .find(|&start| start > pos);
        let target = after
            .or_else(|| {
                doc.textblocks_between(0, pos)
                    .last()
                    .map(|(start, node)| start + 1 + node.content_size())
            })
            .unwrap_or(pos);
        Self::cursor(target)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Keep both ends inside a document of the given content size
    pub fn clamp(&self, size: usize) -> Self {
        Self::new(self.anchor.min(size), self.head.min(size))
    }

    pub fn map<F: Fn(usize) -> usize>(&self, f: F) -> Self {
        Self::new(f(self.anchor), f(self.head))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_to_are_ordered() {
        let sel = Selection::new(7, 3);
        assert_eq!(sel.from(), 3);
        assert_eq!(sel.to(), 7);
        assert!(!sel.is_empty());
    }

    #[test]
    fn test_at_start_and_end() {
        let doc = Node::doc(vec![
            Node::paragraph(vec![Node::text("ab")]),
            Node::paragraph(vec![Node::text("cd")]),
        ]);
        assert_eq!(Selection::at_start(&doc), Selection::cursor(1));
        assert_eq!(Selection::at_end(&doc), Selection::cursor(7));
        assert_eq!(Selection::all(&doc), Selection::new(0, 8));
    }

    #[test]
    fn test_near_moves_into_textblocks() {
        let doc = Node::doc(vec![
            Node::paragraph(vec![Node::text("ab")]),
            Node::horizontal_rule(),
            Node::paragraph(vec![Node::text("cd")]),
        ]);
        assert_eq!(Selection::near(&doc, 2), Selection::cursor(2));
        assert_eq!(Selection::near(&doc, 4), Selection::cursor(6));
        assert_eq!(Selection::near(&doc, 9), Selection::cursor(8));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Selection::new(2, 40).clamp(10), Selection::new(2, 10));
    }
}
