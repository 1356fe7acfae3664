//! Undo/redo history
//!
//! The history is a bounded list of entries with a cursor. Each entry keeps the
//! forward steps of a transaction and their exact inverse, so undo and redo are
//! ordinary transactions replayed through `EditorState::apply`.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::models::node::Node;
use crate::models::selection::Selection;
use crate::transform::{HistoryAction, InputKind, Step, Transaction};

/// One undoable unit of work
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Steps as originally applied
    pub forward: Vec<Step>,
    /// Inverse steps, already in replay order
    pub inverse: Vec<Step>,
    pub selection_before: Selection,
    pub selection_after: Selection,
    pub input: InputKind,
    /// Time of the latest transaction folded into this entry (ms)
    pub time: u64,
}

impl HistoryEntry {
    /// Whether the entry starts by inserting whitespace
    fn starts_with_whitespace(&self) -> bool {
        let first_text = self.forward.iter().find_map(|step| match step {
            Step::Replace { content, .. } => content.first().and_then(Node::as_text),
            _ => None,
        });
        first_text
            .and_then(|text| text.chars().next())
            .map(char::is_whitespace)
            .unwrap_or(false)
    }
}

/// Manages undo/redo history with typing groups
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UndoStack {
    /// Entries that can be undone (before the cursor) or redone (after it)
    pub entries: VecDeque<Arc<HistoryEntry>>,
    /// Current position in the stack (for redo support)
    pub current_index: usize,
    /// Maximum number of entries to keep in history
    max_size: usize,
    /// Window in which consecutive typing is grouped (ms)
    group_delay: u64,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100, 500)
    }
}

impl PartialEq for UndoStack {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries && self.current_index == other.current_index && self.max_size == other.max_size
    }
}

impl UndoStack {
    /// Create a new undo stack with the given depth and grouping window
    pub fn new(max_size: usize, group_delay: u64) -> Self {
        Self { entries: VecDeque::new(), current_index: 0, max_size: max_size.max(1), group_delay }
    }

    /// Record an entry, grouping it with the previous one when possible
    ///
    /// Grouping requires:
    /// - the same non-command input kind (typing with typing, deletion with deletion)
    /// - no redo branch
    /// - an unbroken caret (the previous entry ended where this one starts)
    /// - a pause no longer than the group delay
    /// - typing that does not start with whitespace
    pub fn push(&mut self, entry: HistoryEntry) {
        // Truncate any redo history when a new entry is added
        let had_redo = self.can_redo();
        self.entries.truncate(self.current_index);

        if !had_redo {
            if let Some(last) = self.entries.back() {
                if self.should_group(last, &entry) {
                    let merged = merge(last, entry);
                    if let Some(slot) = self.entries.back_mut() {
                        *slot = Arc::new(merged);
                    }
                    return;
                }
            }
        }

        self.entries.push_back(Arc::new(entry));
        self.current_index = self.entries.len();

        // Enforce max size
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
            self.current_index = self.current_index.saturating_sub(1);
        }
    }

    fn should_group(&self, last: &HistoryEntry, entry: &HistoryEntry) -> bool {
        if entry.input == InputKind::Command || entry.input != last.input {
            return false;
        }
        if last.selection_after != entry.selection_before {
            return false;
        }
        if entry.time.saturating_sub(last.time) > self.group_delay {
            return false;
        }
        !(entry.input == InputKind::Typing && entry.starts_with_whitespace())
    }

    /// Transaction that undoes the entry before the cursor
    pub fn undo_transaction(&self) -> Option<Transaction> {
        if !self.can_undo() {
            return None;
        }
        let entry = &self.entries[self.current_index - 1];
        Some(Transaction {
            steps: entry.inverse.clone(),
            selection: Some(entry.selection_before),
            ..Transaction::default()
        }
        .with_history_action(HistoryAction::Undo))
    }

    /// Transaction that redoes the entry after the cursor
    pub fn redo_transaction(&self) -> Option<Transaction> {
        if !self.can_redo() {
            return None;
        }
        let entry = &self.entries[self.current_index];
        Some(Transaction {
            steps: entry.forward.clone(),
            selection: Some(entry.selection_after),
            ..Transaction::default()
        }
        .with_history_action(HistoryAction::Redo))
    }

    /// Move the cursor back after an undo transaction was applied
    pub fn step_back(&mut self) {
        self.current_index = self.current_index.saturating_sub(1);
    }

    /// Move the cursor forward after a redo transaction was applied
    pub fn step_forward(&mut self) {
        if self.can_redo() {
            self.current_index += 1;
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.current_index < self.entries.len()
    }

    /// Clear all undo history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_index = 0;
    }

    /// Get the number of available undo steps
    pub fn undo_count(&self) -> usize {
        self.current_index
    }

    /// Get the number of available redo steps
    pub fn redo_count(&self) -> usize {
        self.entries.len() - self.current_index
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

fn merge(last: &HistoryEntry, entry: HistoryEntry) -> HistoryEntry {
    let mut forward = last.forward.clone();
    forward.extend(entry.forward);
    let mut inverse = entry.inverse;
    inverse.extend(last.inverse.iter().cloned());
    HistoryEntry {
        forward,
        inverse,
        selection_before: last.selection_before,
        selection_after: entry.selection_after,
        input: entry.input,
        time: entry.time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typing(text: &str, at: usize, time: u64) -> HistoryEntry {
        let len = text.chars().count();
        HistoryEntry {
            forward: vec![Step::insert(at, vec![Node::text(text)])],
            inverse: vec![Step::delete(at, at + len)],
            selection_before: Selection::cursor(at),
            selection_after: Selection::cursor(at + len),
            input: InputKind::Typing,
            time,
        }
    }

    #[test]
    fn test_undo_stack_basic() {
        let mut stack = UndoStack::new(10, 500);
        stack.push(typing("S", 1, 0));

        assert!(stack.can_undo());
        assert!(!stack.can_redo());

        let undo = stack.undo_transaction().unwrap();
        assert_eq!(undo.steps, vec![Step::delete(1, 2)]);
        assert_eq!(undo.meta.history, Some(HistoryAction::Undo));
        stack.step_back();
        assert!(!stack.can_undo());
        assert!(stack.can_redo());

        let redo = stack.redo_transaction().unwrap();
        assert_eq!(redo.selection, Some(Selection::cursor(2)));
        stack.step_forward();
        assert!(stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_typing_groups_until_whitespace() {
        let mut stack = UndoStack::new(10, 500);
        stack.push(typing("S", 1, 0));
        stack.push(typing("r", 2, 100));
        assert_eq!(stack.entries.len(), 1);

        stack.push(typing(" ", 3, 200));
        assert_eq!(stack.entries.len(), 2);

        // The merged entry undoes newest-first
        let first = &stack.entries[0];
        assert_eq!(first.inverse, vec![Step::delete(2, 3), Step::delete(1, 2)]);
        assert_eq!(first.selection_before, Selection::cursor(1));
    }

    #[test]
    fn test_grouping_breaks_on_pause_and_caret_jump() {
        let mut stack = UndoStack::new(10, 500);
        stack.push(typing("a", 1, 0));
        stack.push(typing("b", 2, 900));
        assert_eq!(stack.entries.len(), 2);

        stack.push(typing("c", 7, 950));
        assert_eq!(stack.entries.len(), 3);
    }

    #[test]
    fn test_commands_never_group() {
        let mut stack = UndoStack::new(10, 500);
        let mut entry = typing("a", 1, 0);
        entry.input = InputKind::Command;
        stack.push(entry.clone());
        entry.selection_before = Selection::cursor(2);
        stack.push(entry);
        assert_eq!(stack.undo_count(), 2);
    }

    #[test]
    fn test_new_edit_drops_redo_branch() {
        let mut stack = UndoStack::new(10, 500);
        stack.push(typing("a", 1, 0));
        stack.push(typing(" ", 2, 10));
        stack.step_back();
        assert_eq!(stack.redo_count(), 1);

        stack.push(typing("x", 2, 20));
        assert_eq!(stack.redo_count(), 0);
        assert_eq!(stack.undo_count(), 2);
    }

    #[test]
    fn test_max_size_enforcement() {
        let mut stack = UndoStack::new(3, 0);
        for i in 0..5 {
            let mut entry = typing("S", i + 1, i as u64 * 1000);
            entry.input = InputKind::Command;
            stack.push(entry);
        }
        assert_eq!(stack.entries.len(), 3);
        assert_eq!(stack.undo_count(), 3);
    }
}
