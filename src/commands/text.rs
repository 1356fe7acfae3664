//! Typing, deletion and block splitting

use crate::models::editor_state::EditorState;
use crate::models::errors::StepError;
use crate::models::marks::MarkSet;
use crate::models::node::{Node, NodeAttrs};
use crate::models::schema::NodeType;
use crate::models::selection::Selection;
use crate::transform::{InputKind, Step, StoredMarks, Transaction, Transform};
use crate::utils::char_len;

use super::blocks::{coerce_inline, set_block_type};
use super::lists::lift_list_item;
use super::textblock_at;

// ============================================================================
// Range deletion
// ============================================================================

/// Delete `from..to`, joining the blocks cut open at either end
///
/// Returns the cursor position after the deletion.
pub fn delete_range(tr: &mut Transform, from: usize, to: usize) -> Result<usize, StepError> {
    if from >= to {
        return Ok(from);
    }
    let doc = tr.doc().clone();
    let rf = doc.resolve(from)?;
    let rt = doc.resolve(to)?;

    let depth = rf.depth();
    if rt.depth() == depth && rf.start(depth) == rt.start(depth) {
        let parent = rf.parent();
        // Emptying a block container leaves an empty paragraph behind
        if !parent.is_textblock() && from == rf.start(depth) && to == rf.end(depth) {
            tr.replace(from, to, vec![Node::paragraph(Vec::new())])?;
            return Ok(from + 1);
        }
        tr.delete(from, to)?;
        return Ok(from);
    }

    let shared_depth = rf.shared_depth(to);
    let shared = rf.node(shared_depth);
    let start = rf.start(shared_depth);
    let start_index = rf.index(shared_depth);
    let end_index = rt.index_after(shared_depth).max(start_index);
    let range_from = start + shared.child_offset(start_index);
    let range_to = start + shared.child_offset(end_index);

    let left = (rf.depth() > shared_depth)
        .then(|| shared.child(start_index))
        .flatten()
        .map(|child| child.cut(0, from - range_from - 1));
    let right = (rt.depth() > shared_depth && end_index > 0)
        .then(|| shared.child(end_index - 1))
        .flatten()
        .map(|child| {
            let before = start + shared.child_offset(end_index - 1);
            child.cut(to - before - 1, child.content_size())
        });

    let joined_left = left.is_some();
    let mut content = match (left, right) {
        (Some(left), Some(right)) => join(left, right),
        (Some(left), None) => vec![left],
        (None, Some(right)) => vec![right],
        (None, None) => Vec::new(),
    };
    if content.is_empty() && start_index == 0 && end_index == shared.child_count() {
        content.push(Node::paragraph(Vec::new()));
    }

    tr.replace(range_from, range_to, content)?;
    Ok(if joined_left { from } else { Selection::near(tr.doc(), range_from).head })
}

/// Join two sibling blocks along their facing edges
///
/// The last textblock of `left` absorbs the first textblock of `right`;
/// whatever is left of `right` follows.
fn join(left: Node, right: Node) -> Vec<Node> {
    if left.is_textblock() && right.is_textblock() {
        let mut content = left.children().to_vec();
        content.extend(coerce_inline(left.node_type(), right.children()));
        return vec![left.with_content(content)];
    }
    if !left.is_textblock() && !left.is_leaf() {
        if let Some(last) = left.last_child() {
            let mut content = left.children()[..left.child_count() - 1].to_vec();
            content.extend(join(last.clone(), right));
            return vec![left.with_content(content)];
        }
    }
    if !right.is_textblock() && !right.is_leaf() {
        if let Some(first) = right.first_child() {
            let mut joined = join(left, first.clone());
            let rest = &right.children()[1..];
            if !rest.is_empty() {
                joined.push(right.with_content(rest.to_vec()));
            }
            return joined;
        }
    }
    vec![left, right]
}

fn deletion(tr: Transform, cursor: usize) -> Transaction {
    Transaction::from_transform(tr)
        .with_selection(Selection::cursor(cursor))
        .with_input(InputKind::Deletion)
}

// ============================================================================
// Commands
// ============================================================================

/// Replace the selection with `text`
pub fn insert_text(state: &EditorState, text: &str) -> Option<Transaction> {
    if text.is_empty() {
        return None;
    }
    let selection = state.selection;
    let marks = if selection.is_empty() {
        state.active_marks()
    } else {
        state.doc.resolve(selection.from()).ok()?.marks()
    };

    let mut tr = state.tr();
    let pos = delete_range(&mut tr, selection.from(), selection.to()).ok()?;
    let parent_type = {
        let (rp, _) = textblock_at(tr.doc(), pos)?;
        rp.parent().node_type()
    };
    let marks: MarkSet = marks.iter().filter(|m| state.schema.allows_mark(parent_type, *m)).collect();

    tr.insert_text(pos, text, marks).ok()?;
    Some(
        Transaction::from_transform(tr)
            .with_selection(Selection::cursor(pos + char_len(text)))
            .with_input(InputKind::Typing),
    )
}

/// Backspace
pub fn delete_backward(state: &EditorState) -> Option<Transaction> {
    let selection = state.selection;
    let mut tr = state.tr();
    if !selection.is_empty() {
        let cursor = delete_range(&mut tr, selection.from(), selection.to()).ok()?;
        return Some(deletion(tr, cursor));
    }

    let head = selection.head;
    let (rp, depth) = textblock_at(&state.doc, head)?;
    if rp.parent_offset() > 0 {
        tr.delete(head - 1, head).ok()?;
        return Some(deletion(tr, head - 1));
    }

    // At the start of a textblock
    if depth > 0 && rp.node(depth - 1).node_type() == NodeType::ListItem && rp.index(depth - 1) == 0 {
        return lift_list_item(state);
    }
    let before = rp.before(depth);
    let previous = state.doc.resolve(before).ok()?.node_before();
    if let Some(leaf) = previous.filter(|node| node.is_leaf()) {
        let size = leaf.node_size();
        tr.delete(before - size, before).ok()?;
        return Some(deletion(tr, head - size));
    }

    let previous_end = state
        .doc
        .textblocks_between(0, before)
        .into_iter()
        .filter(|(start, node)| start + node.node_size() <= before)
        .last()
        .map(|(start, node)| start + 1 + node.content_size());
    match previous_end {
        Some(end) => {
            let cursor = delete_range(&mut tr, end, head).ok()?;
            Some(deletion(tr, cursor))
        }
        None if rp.parent().node_type() != state.schema.default_textblock() => {
            set_block_type(state, state.schema.default_textblock(), NodeAttrs::None)
        }
        None => None,
    }
}

/// Forward delete
pub fn delete_forward(state: &EditorState) -> Option<Transaction> {
    let selection = state.selection;
    let mut tr = state.tr();
    if !selection.is_empty() {
        let cursor = delete_range(&mut tr, selection.from(), selection.to()).ok()?;
        return Some(deletion(tr, cursor));
    }

    let head = selection.head;
    let (rp, depth) = textblock_at(&state.doc, head)?;
    if rp.parent_offset() < rp.parent().content_size() {
        tr.delete(head, head + 1).ok()?;
        return Some(deletion(tr, head));
    }

    // At the end of a textblock
    let after = rp.after(depth);
    let next = state.doc.resolve(after).ok()?.node_after();
    if let Some(leaf) = next.filter(|node| node.is_leaf()) {
        tr.delete(after, after + leaf.node_size()).ok()?;
        return Some(deletion(tr, head));
    }

    let next_start = state
        .doc
        .textblocks_between(after, state.doc.content_size())
        .into_iter()
        .find(|(start, _)| *start >= after)
        .map(|(start, _)| start + 1)?;
    let cursor = delete_range(&mut tr, head, next_start).ok()?;
    Some(deletion(tr, cursor))
}

/// Enter: split the textblock (or list item) at the cursor
///
/// Code blocks get a newline instead, and an empty list item is lifted out of
/// its list.
pub fn split_block(state: &EditorState) -> Option<Transaction> {
    let selection = state.selection;
    if selection.is_empty() {
        if let Some((rp, depth)) = textblock_at(&state.doc, selection.head) {
            let in_item = depth > 0 && rp.node(depth - 1).node_type() == NodeType::ListItem;
            if in_item && rp.parent().content_size() == 0 {
                return lift_list_item(state);
            }
        }
    }

    let mut tr = state.tr();
    let pos = delete_range(&mut tr, selection.from(), selection.to()).ok()?;
    let doc = tr.doc().clone();
    let (rp, depth) = textblock_at(&doc, pos)?;
    let block = rp.parent();

    if block.node_type() == NodeType::CodeBlock {
        tr.insert_text(pos, "\n", MarkSet::new()).ok()?;
        return Some(Transaction::from_transform(tr).with_selection(Selection::cursor(pos + 1)));
    }

    let item_first = depth > 0 && rp.node(depth - 1).node_type() == NodeType::ListItem && rp.index(depth - 1) == 0;
    let split_depth = if item_first { depth - 1 } else { depth };
    let node = rp.node(split_depth);
    let offset = pos - rp.start(split_depth);

    let left = node.cut(0, offset);
    let mut right = node.cut(offset, node.content_size());
    // A block split at its very end continues as a plain paragraph
    let default_type = state.schema.default_textblock();
    if split_depth == depth && offset == node.content_size() && node.node_type() != default_type {
        right = Node::new(default_type, NodeAttrs::None, Vec::new());
    }

    let before = rp.before(split_depth);
    tr.replace(before, before + node.node_size(), vec![left, right]).ok()?;

    let marks = rp.marks();
    let cursor = pos + 2 * (depth - split_depth + 1);
    let tr = Transaction::from_transform(tr).with_selection(Selection::cursor(cursor));
    Some(if marks.is_empty() { tr } else { tr.with_stored_marks(StoredMarks::Set(marks)) })
}

/// Shift-Enter: a hard break, or a newline inside code blocks
pub fn insert_hard_break(state: &EditorState) -> Option<Transaction> {
    let selection = state.selection;
    let mut tr = state.tr();
    let pos = delete_range(&mut tr, selection.from(), selection.to()).ok()?;
    let parent_type = {
        let (rp, _) = textblock_at(tr.doc(), pos)?;
        rp.parent().node_type()
    };

    let result = if parent_type == NodeType::CodeBlock {
        tr.insert_text(pos, "\n", MarkSet::new())
    } else {
        tr.step(Step::insert(pos, vec![Node::hard_break()]))
    };
    result.ok()?;
    Some(Transaction::from_transform(tr).with_selection(Selection::cursor(pos + 1)))
}

pub fn select_all(state: &EditorState) -> Option<Transaction> {
    Some(Transaction::new().with_selection(Selection::all(&state.doc)))
}
