//! Atomic document steps
//!
//! A step is the smallest unit of change. Applying a step either yields a new,
//! schema-valid document or fails without touching anything. Every step can
//! compute its exact inverse against the document it is about to be applied
//! to, which is what undo replays.

use serde::{Deserialize, Serialize};

use crate::models::errors::StepError;
use crate::models::marks::{MarkSet, MarkType};
use crate::models::node::{Node, NodeAttrs, ResolvedPos};
use crate::models::schema::{NodeType, Schema};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stepType", rename_all = "camelCase")]
pub enum Step {
    /// Replace `from..to` (both inside the same parent) with `content`
    Replace { from: usize, to: usize, content: Vec<Node> },
    AddMark { from: usize, to: usize, mark: MarkType },
    RemoveMark { from: usize, to: usize, mark: MarkType },
    /// Change the type of the textblock starting at `pos`
    SetNodeType { pos: usize, node_type: NodeType, attrs: NodeAttrs },
}

impl Step {
    pub fn insert(pos: usize, content: Vec<Node>) -> Self {
        Step::Replace { from: pos, to: pos, content }
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Step::Replace { from, to, content: Vec::new() }
    }

    /// Apply to `doc`, validating the result against `schema`
    pub fn apply(&self, schema: &Schema, doc: &Node) -> Result<Node, StepError> {
        let result = match self {
            Step::Replace { from, to, content } => apply_replace(doc, *from, *to, content)?,
            Step::AddMark { from, to, mark } => {
                check_range(doc, *from, *to)?;
                map_marks(doc, 0, *from, *to, &|marks| marks.with(*mark))
            }
            Step::RemoveMark { from, to, mark } => {
                check_range(doc, *from, *to)?;
                map_marks(doc, 0, *from, *to, &|marks| marks.without(*mark))
            }
            Step::SetNodeType { pos, node_type, attrs } => apply_set_node_type(doc, *pos, *node_type, *attrs)?,
        };
        schema.check_document(&result)?;
        Ok(result)
    }

    /// The step that undoes this one, computed against the document before it
    pub fn invert(&self, doc: &Node) -> Result<Step, StepError> {
        match self {
            Step::Replace { from, to, content } => {
                check_range(doc, *from, *to)?;
                let rp = doc.resolve(*from)?;
                let start = rp.start(rp.depth());
                let old = rp.parent().content_between(from - start, to - start);
                Ok(Step::Replace { from: *from, to: from + fragment_size(content), content: old })
            }
            Step::AddMark { from, to, .. } | Step::RemoveMark { from, to, .. } => {
                check_range(doc, *from, *to)?;
                restore_range(doc, *from, *to)
            }
            Step::SetNodeType { pos, .. } => {
                let node = doc.node_at(*pos).ok_or(StepError::NotTextblock(*pos))?;
                Ok(Step::SetNodeType { pos: *pos, node_type: node.node_type(), attrs: *node.attrs() })
            }
        }
    }

    /// Map a position in the document before this step to the document after
    ///
    /// `assoc` decides which side a position at an insertion point sticks to:
    /// negative stays before the inserted content, positive moves after it.
    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        match self {
            Step::Replace { from, to, content } => {
                let (from, to) = (*from, *to);
                let new_end = from + fragment_size(content);
                if pos < from {
                    pos
                } else if pos > to {
                    pos - (to - from) + fragment_size(content)
                } else if pos == from && pos == to {
                    if assoc < 0 {
                        pos
                    } else {
                        new_end
                    }
                } else if pos == from {
                    pos
                } else if pos == to || assoc >= 0 {
                    new_end
                } else {
                    from
                }
            }
            _ => pos,
        }
    }
}

/// Total size of a list of sibling nodes
pub fn fragment_size(content: &[Node]) -> usize {
    content.iter().map(Node::node_size).sum()
}

fn check_range(doc: &Node, from: usize, to: usize) -> Result<(), StepError> {
    if from > to {
        return Err(StepError::InvalidRange { from, to });
    }
    if to > doc.content_size() {
        return Err(StepError::OutOfRange { pos: to, size: doc.content_size() });
    }
    Ok(())
}

/// Rebuild the ancestors of `rp` above `depth` around a replaced node
fn rebuild(rp: &ResolvedPos<'_>, depth: usize, replacement: Node) -> Node {
    let mut node = replacement;
    for d in (0..depth).rev() {
        node = rp.node(d).replace_child(rp.index(d), node);
    }
    node
}

fn apply_replace(doc: &Node, from: usize, to: usize, content: &[Node]) -> Result<Node, StepError> {
    check_range(doc, from, to)?;
    let rf = doc.resolve(from)?;
    let rt = doc.resolve(to)?;
    let depth = rf.depth();
    if rt.depth() != depth || rf.start(depth) != rt.start(depth) {
        return Err(StepError::MismatchedParents { from, to });
    }

    let parent = rf.parent();
    let start = rf.start(depth);
    let mut children = parent.content_between(0, from - start);
    children.extend(content.iter().cloned());
    children.extend(parent.content_between(to - start, parent.content_size()));
    Ok(rebuild(&rf, depth, parent.with_content(children)))
}

fn apply_set_node_type(doc: &Node, pos: usize, node_type: NodeType, attrs: NodeAttrs) -> Result<Node, StepError> {
    let rp = doc.resolve(pos)?;
    let target = rp.node_after().ok_or(StepError::NotTextblock(pos))?;
    if !target.is_textblock() || !node_type.is_textblock() {
        return Err(StepError::NotTextblock(pos));
    }
    let depth = rp.depth();
    let parent = rp.parent().replace_child(rp.index(depth), target.with_type(node_type, attrs));
    Ok(rebuild(&rp, depth, parent))
}

/// Rewrite the marks of all text overlapping `from..to`
fn map_marks(node: &Node, content_start: usize, from: usize, to: usize, f: &dyn Fn(&MarkSet) -> MarkSet) -> Node {
    let mut children = Vec::with_capacity(node.child_count());
    let mut pos = content_start;
    for child in node.children() {
        let end = pos + child.node_size();
        if end <= from || pos >= to {
            children.push(child.clone());
        } else if child.is_text() {
            let len = child.node_size();
            let start = from.saturating_sub(pos);
            let stop = (to - pos).min(len);
            children.push(child.text_slice(0, start));
            children.push(child.text_slice(start, stop).with_marks(f(child.marks())));
            children.push(child.text_slice(stop, len));
        } else if child.is_leaf() {
            children.push(child.clone());
        } else {
            children.push(map_marks(child, pos + 1, from, to, f));
        }
        pos = end;
    }
    node.with_content(children)
}

/// Replace step restoring the smallest node range that contains `from..to`
fn restore_range(doc: &Node, from: usize, to: usize) -> Result<Step, StepError> {
    let rf = doc.resolve(from)?;
    let rt = doc.resolve(to)?;
    let depth = rf.shared_depth(to);
    let parent = rf.node(depth);
    let start = rf.start(depth);

    if parent.is_textblock() {
        let content = parent.content_between(from - start, to - start);
        return Ok(Step::Replace { from, to, content });
    }

    let start_index = rf.index(depth);
    let end_index = rt.index_after(depth).max(start_index);
    let range_from = start + parent.child_offset(start_index);
    let range_to = start + parent.child_offset(end_index);
    let content = parent.children()[start_index..end_index.min(parent.child_count())].to_vec();
    Ok(Step::Replace { from: range_from, to: range_to, content })
}
