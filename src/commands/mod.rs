//! Editing commands
//!
//! A command inspects an `EditorState` and either proposes a `Transaction` or
//! refuses with `None`. Commands never touch the state themselves; the caller
//! applies the transaction. Toolbar buttons and key bindings both resolve to an
//! `EditorCommand` and go through `run`, so the two paths cannot drift apart.

pub mod blocks;
pub mod keymap;
pub mod lists;
pub mod marks;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::models::editor_state::EditorState;
use crate::models::marks::MarkType;
use crate::models::node::{Node, NodeAttrs, ResolvedPos};
use crate::models::schema::NodeType;
use crate::models::selection::Selection;
use crate::transform::Transaction;

pub use blocks::set_block_type;
pub use keymap::{KeyEvent, Keymap, ToolbarAction};
pub use lists::{lift_list_item, wrap_in_list};
pub use marks::toggle_mark;
pub use text::{delete_backward, delete_forward, insert_hard_break, insert_text, select_all, split_block};

/// Every command the dispatcher knows about
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum EditorCommand {
    ToggleMark {
        mark: MarkType,
    },
    WrapInList {
        #[serde(rename = "listType")]
        list_type: NodeType,
    },
    SetBlockType {
        #[serde(rename = "nodeType")]
        node_type: NodeType,
        #[serde(default)]
        attrs: NodeAttrs,
    },
    InsertText {
        text: String,
    },
    DeleteBackward,
    DeleteForward,
    SplitBlock,
    InsertHardBreak,
    LiftListItem,
    SelectAll,
    Undo,
    Redo,
}

impl EditorCommand {
    /// Shorthand for headings
    pub fn heading(level: u8) -> Self {
        EditorCommand::SetBlockType { node_type: NodeType::Heading, attrs: NodeAttrs::Heading { level } }
    }

    pub fn paragraph() -> Self {
        EditorCommand::SetBlockType { node_type: NodeType::Paragraph, attrs: NodeAttrs::None }
    }
}

/// Run a command against `state`
pub fn run(command: &EditorCommand, state: &EditorState) -> Option<Transaction> {
    match command {
        EditorCommand::ToggleMark { mark } => toggle_mark(state, *mark),
        EditorCommand::WrapInList { list_type } => wrap_in_list(state, *list_type),
        EditorCommand::SetBlockType { node_type, attrs } => set_block_type(state, *node_type, *attrs),
        EditorCommand::InsertText { text } => insert_text(state, text),
        EditorCommand::DeleteBackward => delete_backward(state),
        EditorCommand::DeleteForward => delete_forward(state),
        EditorCommand::SplitBlock => split_block(state),
        EditorCommand::InsertHardBreak => insert_hard_break(state),
        EditorCommand::LiftListItem => lift_list_item(state),
        EditorCommand::SelectAll => select_all(state),
        EditorCommand::Undo => state.history.undo_transaction(),
        EditorCommand::Redo => state.history.redo_transaction(),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Resolve `pos` when it points into a textblock, with the textblock's depth
pub(crate) fn textblock_at(doc: &Node, pos: usize) -> Option<(ResolvedPos<'_>, usize)> {
    let rp = doc.resolve(pos).ok()?;
    if !rp.parent().is_textblock() {
        return None;
    }
    let depth = rp.depth();
    Some((rp, depth))
}

/// Position ranges moved wholesale by a structural edit
///
/// Each entry is `(old_start, old_end, new_start)`; positions outside every
/// range are left alone.
pub(crate) struct Segments(pub(crate) Vec<(usize, usize, usize)>);

impl Segments {
    pub(crate) fn map(&self, pos: usize) -> usize {
        self.0
            .iter()
            .find(|(from, to, _)| *from <= pos && pos <= *to)
            .map(|(from, _, new_start)| new_start + (pos - from))
            .unwrap_or(pos)
    }

    pub(crate) fn map_selection(&self, selection: Selection) -> Selection {
        selection.map(|pos| self.map(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::Schema;

    #[test]
    fn test_command_json_shape() {
        let command: EditorCommand = serde_json::from_str(r#"{"command":"toggleMark","mark":"strong"}"#).unwrap();
        assert_eq!(command, EditorCommand::ToggleMark { mark: MarkType::Bold });

        let command: EditorCommand = serde_json::from_str(r#"{"command":"wrapInList","listType":"bullet_list"}"#).unwrap();
        assert_eq!(command, EditorCommand::WrapInList { list_type: NodeType::BulletList });

        let command: EditorCommand = serde_json::from_str(r#"{"command":"splitBlock"}"#).unwrap();
        assert_eq!(command, EditorCommand::SplitBlock);

        let command: EditorCommand =
            serde_json::from_str(r#"{"command":"setBlockType","nodeType":"heading","attrs":{"level":2}}"#).unwrap();
        assert_eq!(command, EditorCommand::heading(2));

        let command: EditorCommand = serde_json::from_str(r#"{"command":"setBlockType","nodeType":"code_block"}"#).unwrap();
        assert_eq!(command, EditorCommand::SetBlockType { node_type: NodeType::CodeBlock, attrs: NodeAttrs::None });
    }

    #[test]
    fn test_undo_refused_without_history() {
        let state = EditorState::empty(Schema::new());
        assert!(run(&EditorCommand::Undo, &state).is_none());
        assert!(run(&EditorCommand::Redo, &state).is_none());
    }

    #[test]
    fn test_segments_map() {
        let segments = Segments(vec![(0, 4, 2), (4, 8, 8)]);
        assert_eq!(segments.map(1), 3);
        assert_eq!(segments.map(6), 10);
        assert_eq!(segments.map(12), 12);
    }
}
