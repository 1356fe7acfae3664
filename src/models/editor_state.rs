//! Editor state management
//!
//! `EditorState` is the complete, immutable state of one editing session:
//! document, selection, stored marks and history. It is never mutated in place;
//! `apply` derives the next state from a transaction and leaves `self` intact,
//! so a failing transaction simply means the caller keeps the old state.

use super::errors::StepError;
use super::marks::{MarkSet, MarkType};
use super::node::Node;
use super::schema::Schema;
use super::selection::Selection;
use crate::transform::{HistoryAction, StoredMarks, Transaction, Transform};
use crate::undo::{HistoryEntry, UndoStack};

/// Complete editor state (WASM-owned source of truth)
#[derive(Clone, Debug, PartialEq)]
pub struct EditorState {
    pub doc: Node,
    pub schema: Schema,
    pub selection: Selection,
    /// Marks applied to the next typed text, overriding the ones at the cursor
    pub stored_marks: Option<MarkSet>,
    pub history: UndoStack,
}

impl EditorState {
    /// Create a state for `doc` with the cursor at its start
    pub fn new(schema: Schema, doc: Node) -> Self {
        let selection = Selection::at_start(&doc);
        Self { doc, schema, selection, stored_marks: None, history: UndoStack::default() }
    }

    /// State holding the schema's empty document
    pub fn empty(schema: Schema) -> Self {
        Self::new(schema, schema.empty_document())
    }

    /// Replace the (fresh) history with one of a different depth or grouping window
    pub fn with_history(mut self, history: UndoStack) -> Self {
        self.history = history;
        self
    }

    /// Start a transform against the current document
    pub fn tr(&self) -> Transform {
        Transform::new(self.schema, self.doc.clone())
    }

    /// Derive the next state
    pub fn apply(&self, tr: &Transaction) -> Result<EditorState, StepError> {
        let mut doc = self.doc.clone();
        let mut inverse = Vec::with_capacity(tr.steps.len());
        for step in &tr.steps {
            inverse.push(step.invert(&doc)?);
            doc = step.apply(&self.schema, &doc)?;
        }
        inverse.reverse();

        let selection = tr
            .selection
            .unwrap_or_else(|| self.selection.map(|pos| tr.map(pos, 1)))
            .clamp(doc.content_size());
        let selection = snap_to_textblock(&doc, selection);

        let stored_marks = match &tr.stored_marks {
            StoredMarks::Set(marks) => Some(marks.clone()),
            StoredMarks::Clear => None,
            StoredMarks::Keep if tr.doc_changed() => None,
            StoredMarks::Keep => self.stored_marks.clone(),
        };

        let mut history = self.history.clone();
        match tr.meta.history {
            Some(HistoryAction::Undo) => history.step_back(),
            Some(HistoryAction::Redo) => history.step_forward(),
            None if tr.doc_changed() && tr.meta.add_to_history => history.push(HistoryEntry {
                forward: tr.steps.clone(),
                inverse,
                selection_before: self.selection,
                selection_after: selection,
                input: tr.meta.input,
                time: tr.meta.time,
            }),
            None => {}
        }

        Ok(EditorState { doc, schema: self.schema, selection, stored_marks, history })
    }

    /// Marks that typed text would receive
    pub fn active_marks(&self) -> MarkSet {
        if let Some(marks) = &self.stored_marks {
            return marks.clone();
        }
        self.doc
            .resolve(self.selection.head)
            .map(|rp| rp.marks())
            .unwrap_or_default()
    }

    /// Whether `mark` is on for the current selection
    ///
    /// A range counts as marked when all of its text carries the mark. Text in
    /// textblocks that do not allow the mark is ignored, as the toggle does.
    pub fn is_mark_active(&self, mark: MarkType) -> bool {
        if self.selection.is_empty() {
            return self.active_marks().contains(mark);
        }
        let mut seen = false;
        let mut all = true;
        let (from, to) = (self.selection.from(), self.selection.to());
        for (pos, block) in self.doc.textblocks_between(from, to) {
            if !self.schema.allows_mark(block.node_type(), mark) {
                continue;
            }
            let mut offset = pos + 1;
            for child in block.children() {
                let end = offset + child.node_size();
                if child.is_text() && end > from && offset < to {
                    seen = true;
                    all &= child.marks().contains(mark);
                }
                offset = end;
            }
        }
        seen && all
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

/// Move a collapsed selection that fell between blocks into a textblock
fn snap_to_textblock(doc: &Node, selection: Selection) -> Selection {
    if selection.is_empty() {
        Selection::near(doc, selection.head)
    } else {
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::InputKind;

    fn state_with(text: &str) -> EditorState {
        let doc = Node::doc(vec![Node::paragraph(vec![Node::text(text)])]);
        EditorState::new(Schema::new(), doc)
    }

    fn typing(state: &EditorState, text: &str, time: u64) -> Transaction {
        let mut tr = state.tr();
        tr.insert_text(state.selection.head, text, state.active_marks()).unwrap();
        Transaction::from_transform(tr).with_input(InputKind::Typing).at_time(time)
    }

    #[test]
    fn test_editor_state_new() {
        let state = EditorState::empty(Schema::new());
        assert_eq!(state.selection, Selection::cursor(1));
        assert!(!state.can_undo());
        assert!(state.stored_marks.is_none());
    }

    #[test]
    fn test_apply_maps_selection_and_keeps_old_state() {
        let state = state_with("ab");
        let next = state.apply(&typing(&state, "x", 0)).unwrap();
        assert_eq!(next.doc.text_content(), "xab");
        assert_eq!(next.selection, Selection::cursor(2));
        assert_eq!(state.doc.text_content(), "ab");
        assert!(next.can_undo());
    }

    #[test]
    fn test_failed_transaction_is_an_error() {
        let state = state_with("ab");
        let tr = Transaction { steps: vec![crate::transform::Step::delete(0, 40)], ..Transaction::default() };
        assert!(state.apply(&tr).is_err());
    }

    #[test]
    fn test_selection_only_transaction_skips_history() {
        let state = state_with("abc");
        let next = state.apply(&Transaction::new().with_selection(Selection::new(1, 3))).unwrap();
        assert_eq!(next.selection, Selection::new(1, 3));
        assert!(!next.can_undo());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let state = state_with("ab");
        let edited = state.apply(&typing(&state, "x", 0)).unwrap();

        let undo = edited.history.undo_transaction().unwrap();
        let undone = edited.apply(&undo).unwrap();
        assert_eq!(undone.doc, state.doc);
        assert_eq!(undone.selection, state.selection);
        assert!(undone.can_redo());

        let redo = undone.history.redo_transaction().unwrap();
        let redone = undone.apply(&redo).unwrap();
        assert_eq!(redone.doc, edited.doc);
        assert!(!redone.can_redo());
    }

    #[test]
    fn test_stored_marks_cleared_by_doc_change() {
        let state = state_with("ab");
        let bold = MarkSet::of(&[MarkType::Bold]);
        let marked = state
            .apply(&Transaction::new().with_stored_marks(StoredMarks::Set(bold.clone())))
            .unwrap();
        assert_eq!(marked.active_marks(), bold);
        assert!(marked.is_mark_active(MarkType::Bold));

        let typed = marked.apply(&typing(&marked, "x", 0)).unwrap();
        assert!(typed.stored_marks.is_none());
        assert_eq!(typed.doc.child(0).and_then(|p| p.child(0)).map(|t| t.marks().clone()), Some(bold));
    }

    #[test]
    fn test_mark_active_ignores_code_blocks() {
        let bold = MarkSet::of(&[MarkType::Bold]);
        let doc = Node::doc(vec![
            Node::paragraph(vec![Node::marked_text("ab", bold)]),
            Node::code_block(vec![Node::text("cd")]),
        ]);
        let state = EditorState::new(Schema::new(), doc);
        let across = state.apply(&Transaction::new().with_selection(Selection::new(1, 7))).unwrap();
        assert!(across.is_mark_active(MarkType::Bold));
        assert!(!across.is_mark_active(MarkType::Italic));

        // Only code block text selected: nothing can carry the mark
        let code = state.apply(&Transaction::new().with_selection(Selection::new(5, 7))).unwrap();
        assert!(!code.is_mark_active(MarkType::Bold));
    }

    #[test]
    fn test_selection_snaps_into_textblock() {
        let doc = Node::doc(vec![Node::horizontal_rule(), Node::paragraph(vec![Node::text("ab")])]);
        let state = EditorState::new(Schema::new(), doc);
        assert_eq!(state.selection, Selection::cursor(2));
        let next = state.apply(&Transaction::new().with_selection(Selection::cursor(0))).unwrap();
        assert_eq!(next.selection, Selection::cursor(2));
    }
}
