//! List wrapping and lifting

use crate::models::editor_state::EditorState;
use crate::models::node::{Node, NodeAttrs};
use crate::models::schema::NodeType;
use crate::transform::Transaction;

use super::Segments;

/// Wrap the sibling blocks covered by the selection in a list of `list_type`
///
/// Each block becomes its own list item. Refused when the selection already
/// starts a list item of the same list type, or when a block cannot open a
/// list item (only paragraphs can).
pub fn wrap_in_list(state: &EditorState, list_type: NodeType) -> Option<Transaction> {
    if !list_type.is_list() {
        return None;
    }
    let selection = state.selection;
    let doc = &state.doc;
    let rf = doc.resolve(selection.from()).ok()?;
    let rt = doc.resolve(selection.to()).ok()?;

    let mut depth = rf.shared_depth(selection.to());
    if rf.node(depth).is_textblock() {
        depth = depth.checked_sub(1)?;
    }
    let parent = rf.node(depth);
    if parent.node_type() == NodeType::ListItem
        && rf.index(depth) == 0
        && depth > 0
        && rf.node(depth - 1).node_type() == list_type
    {
        return None;
    }

    let start_index = rf.index(depth);
    let end_index = rt.index_after(depth).min(parent.child_count());
    if start_index >= end_index {
        return None;
    }
    let start = rf.start(depth);
    let range_from = start + parent.child_offset(start_index);
    let range_to = start + parent.child_offset(end_index);
    let blocks = &parent.children()[start_index..end_index];

    // Block k moves past the list opening plus k item boundaries
    let mut segments = Vec::with_capacity(blocks.len());
    let mut old = range_from;
    for (k, block) in blocks.iter().enumerate() {
        let size = block.node_size();
        segments.push((old, old + size, old + 2 + 2 * k));
        old += size;
    }

    let items = blocks.iter().map(|block| Node::list_item(vec![block.clone()])).collect();
    let list = Node::new(list_type, list_type.default_attrs(), items);

    let mut tr = state.tr();
    if let Err(err) = tr.replace(range_from, range_to, vec![list]) {
        log::debug!("wrap_in_list({}) refused: {}", list_type, err);
        return None;
    }
    let selection = Segments(segments).map_selection(selection);
    Some(Transaction::from_transform(tr).with_selection(selection))
}

/// Lift the list items covered by the selection out of their list
///
/// The list is split around the lifted items; their contents take the items'
/// place in the list's parent.
pub fn lift_list_item(state: &EditorState) -> Option<Transaction> {
    let selection = state.selection;
    let doc = &state.doc;
    let rf = doc.resolve(selection.from()).ok()?;
    let rt = doc.resolve(selection.to()).ok()?;

    let item_depth = (1..=rf.depth()).rev().find(|&d| rf.node(d).node_type() == NodeType::ListItem)?;
    let list_depth = item_depth - 1;
    let list = rf.node(list_depth);

    let start_index = rf.index(list_depth);
    let end_index = if rf.shared_depth(selection.to()) >= list_depth {
        rt.index_after(list_depth).clamp(start_index + 1, list.child_count())
    } else {
        start_index + 1
    };

    let items = list.children();
    let before = &items[..start_index];
    let lifted = &items[start_index..end_index];
    let after = &items[end_index..];

    let list_pos = rf.before(list_depth);
    let list_start = rf.start(list_depth);

    let mut content = Vec::new();
    let mut new_start = list_pos;
    if !before.is_empty() {
        content.push(list.with_content(before.to_vec()));
        new_start += 2 + list.child_offset(start_index);
    }

    let mut segments = Vec::with_capacity(lifted.len());
    for (k, item) in lifted.iter().enumerate() {
        let old_start = list_start + list.child_offset(start_index + k) + 1;
        segments.push((old_start, old_start + item.content_size(), new_start));
        new_start += item.content_size();
        content.extend(item.children().iter().cloned());
    }

    if !after.is_empty() {
        let attrs = match *list.attrs() {
            NodeAttrs::OrderedList { order } => NodeAttrs::OrderedList {
                order: order.saturating_add(u32::try_from(end_index).unwrap_or(u32::MAX)),
            },
            attrs => attrs,
        };
        content.push(Node::new(list.node_type(), attrs, after.to_vec()));
    }

    let mut tr = state.tr();
    if let Err(err) = tr.replace(list_pos, list_pos + list.node_size(), content) {
        log::debug!("lift_list_item refused: {}", err);
        return None;
    }
    let selection = Segments(segments).map_selection(selection);
    Some(Transaction::from_transform(tr).with_selection(selection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::Schema;
    use crate::models::selection::Selection;

    fn state(doc: Node, selection: Selection) -> EditorState {
        EditorState::new(Schema::new(), doc)
            .apply(&Transaction::new().with_selection(selection))
            .unwrap()
    }

    fn p(text: &str) -> Node {
        Node::paragraph(vec![Node::text(text)])
    }

    fn item(text: &str) -> Node {
        Node::list_item(vec![p(text)])
    }

    #[test]
    fn test_wrap_single_paragraph() {
        let state = state(Node::doc(vec![p("one")]), Selection::cursor(2));
        let next = state.apply(&wrap_in_list(&state, NodeType::BulletList).unwrap()).unwrap();
        assert_eq!(next.doc, Node::doc(vec![Node::bullet_list(vec![item("one")])]));
        assert_eq!(next.selection, Selection::cursor(4));
    }

    #[test]
    fn test_wrap_range_makes_one_item_per_block() {
        let state = state(Node::doc(vec![p("a"), p("b"), p("c")]), Selection::new(1, 5));
        let next = state.apply(&wrap_in_list(&state, NodeType::OrderedList).unwrap()).unwrap();
        assert_eq!(
            next.doc,
            Node::doc(vec![Node::ordered_list(vec![item("a"), item("b")]), p("c")])
        );
        // "a" at 1 -> 3, "b" at 5 -> 9
        assert_eq!(next.selection, Selection::new(3, 9));
    }

    #[test]
    fn test_wrap_refused_inside_same_list() {
        let doc = Node::doc(vec![Node::bullet_list(vec![item("a")])]);
        let state = state(doc, Selection::cursor(3));
        assert!(wrap_in_list(&state, NodeType::BulletList).is_none());
    }

    #[test]
    fn test_wrap_refused_for_heading() {
        let doc = Node::doc(vec![Node::heading(1, vec![Node::text("h")])]);
        let state = state(doc, Selection::cursor(1));
        assert!(wrap_in_list(&state, NodeType::BulletList).is_none());
    }

    #[test]
    fn test_lift_middle_item_splits_list() {
        let doc = Node::doc(vec![Node::ordered_list(vec![item("a"), item("b"), item("c")])]);
        // list 0, item "a" 1..6, item "b" 6..11, its text at 8
        let state = state(doc, Selection::cursor(8));
        let next = state.apply(&lift_list_item(&state).unwrap()).unwrap();
        let expected = Node::doc(vec![
            Node::ordered_list(vec![item("a")]),
            p("b"),
            Node::new(NodeType::OrderedList, NodeAttrs::OrderedList { order: 3 }, vec![item("c")]),
        ]);
        assert_eq!(next.doc, expected);
        // ordered_list(item(p(a))) is 7 wide, so "b" starts at 8
        assert_eq!(next.selection, Selection::cursor(8));
    }

    #[test]
    fn test_lift_only_item_unwraps_list() {
        let doc = Node::doc(vec![Node::bullet_list(vec![item("x")])]);
        let state = state(doc, Selection::cursor(4));
        let next = state.apply(&lift_list_item(&state).unwrap()).unwrap();
        assert_eq!(next.doc, Node::doc(vec![p("x")]));
        assert_eq!(next.selection, Selection::cursor(2));
    }

    #[test]
    fn test_lift_keeps_order_of_high_numbered_list() {
        let list = Node::new(NodeType::OrderedList, NodeAttrs::OrderedList { order: u32::MAX }, vec![item("a"), item("b")]);
        let state = state(Node::doc(vec![list]), Selection::cursor(3));
        let next = state.apply(&lift_list_item(&state).unwrap()).unwrap();
        let expected = Node::doc(vec![
            p("a"),
            Node::new(NodeType::OrderedList, NodeAttrs::OrderedList { order: u32::MAX }, vec![item("b")]),
        ]);
        assert_eq!(next.doc, expected);
        assert_eq!(next.selection, Selection::cursor(1));
    }

    #[test]
    fn test_lift_outside_list_is_refused() {
        let state = state(Node::doc(vec![p("x")]), Selection::cursor(1));
        assert!(lift_list_item(&state).is_none());
    }
}
