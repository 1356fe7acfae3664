//! Block type conversion

use crate::models::editor_state::EditorState;
use crate::models::node::{Node, NodeAttrs};
use crate::models::schema::{MarkRule, NodeType};
use crate::transform::Transaction;

/// Inline content adjusted to what `target` accepts
///
/// Blocks that take no marks (code blocks) get plain text: marks are dropped
/// and hard breaks become newlines.
pub fn coerce_inline(target: NodeType, children: &[Node]) -> Vec<Node> {
    if target.spec().marks == MarkRule::All {
        return children.to_vec();
    }
    children
        .iter()
        .filter_map(|child| match child.node_type() {
            NodeType::Text if child.marks().is_empty() => Some(child.clone()),
            NodeType::Text => Some(Node::text(child.as_text().unwrap_or_default())),
            NodeType::HardBreak => Some(Node::text("\n")),
            _ => None,
        })
        .collect()
}

/// Convert every textblock touched by the selection to `node_type`
///
/// Refused when nothing would change or when the result breaks the schema
/// (a heading cannot open a list item, for instance).
pub fn set_block_type(state: &EditorState, node_type: NodeType, attrs: NodeAttrs) -> Option<Transaction> {
    if !node_type.is_textblock() || !node_type.accepts_attrs(&attrs) {
        return None;
    }
    let selection = state.selection;
    let mut tr = state.tr();

    for (pos, block) in state.doc.textblocks_between(selection.from(), selection.to()) {
        if block.node_type() == node_type && *block.attrs() == attrs {
            continue;
        }
        let content = coerce_inline(node_type, block.children());
        // Coercion keeps sizes, so positions collected up front stay valid
        let result = if content.as_slice() == block.children() {
            tr.set_node_type(pos, node_type, attrs)
        } else {
            tr.replace(pos, pos + block.node_size(), vec![Node::new(node_type, attrs, content)])
        };
        if let Err(err) = result {
            log::debug!("set_block_type({}) refused: {}", node_type, err);
            return None;
        }
    }

    if !tr.doc_changed() {
        return None;
    }
    Some(Transaction::from_transform(tr).with_selection(selection))
}
