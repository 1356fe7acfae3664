//! Transforms and transactions
//!
//! A `Transform` accumulates steps while tracking the intermediate document, so
//! commands can build later steps against the result of earlier ones. Once
//! complete it becomes a `Transaction`: plain data (steps, resulting selection,
//! stored marks, metadata) that `EditorState::apply` replays deterministically.

use serde::{Deserialize, Serialize};

use super::step::Step;
use crate::models::errors::StepError;
use crate::models::marks::{MarkSet, MarkType};
use crate::models::node::{Node, NodeAttrs};
use crate::models::schema::{NodeType, Schema};
use crate::models::selection::Selection;

/// Step builder over a working copy of a document
#[derive(Clone, Debug)]
pub struct Transform {
    schema: Schema,
    doc: Node,
    steps: Vec<Step>,
}

impl Transform {
    pub fn new(schema: Schema, doc: Node) -> Self {
        Self { schema, doc, steps: Vec::new() }
    }

    /// Apply a step to the working document and record it
    pub fn step(&mut self, step: Step) -> Result<&mut Self, StepError> {
        self.doc = step.apply(&self.schema, &self.doc)?;
        self.steps.push(step);
        Ok(self)
    }

    pub fn replace(&mut self, from: usize, to: usize, content: Vec<Node>) -> Result<&mut Self, StepError> {
        self.step(Step::Replace { from, to, content })
    }

    pub fn insert_text(&mut self, pos: usize, text: &str, marks: MarkSet) -> Result<&mut Self, StepError> {
        self.step(Step::insert(pos, vec![Node::marked_text(text, marks)]))
    }

    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, StepError> {
        self.step(Step::delete(from, to))
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: MarkType) -> Result<&mut Self, StepError> {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, mark: MarkType) -> Result<&mut Self, StepError> {
        self.step(Step::RemoveMark { from, to, mark })
    }

    pub fn set_node_type(&mut self, pos: usize, node_type: NodeType, attrs: NodeAttrs) -> Result<&mut Self, StepError> {
        self.step(Step::SetNodeType { pos, node_type, attrs })
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Map a position from the starting document through every step so far
    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.steps.iter().fold(pos, |pos, step| step.map(pos, assoc))
    }
}

/// How a transaction changes the stored marks of the state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredMarks {
    /// Keep them, unless the document changes
    #[default]
    Keep,
    Set(MarkSet),
    Clear,
}

/// What kind of input produced a transaction (drives history grouping)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    #[default]
    Command,
    Typing,
    Deletion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    Undo,
    Redo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMeta {
    /// Milliseconds, host clock
    pub time: u64,
    pub add_to_history: bool,
    pub input: InputKind,
    pub history: Option<HistoryAction>,
}

impl Default for TransactionMeta {
    fn default() -> Self {
        Self { time: 0, add_to_history: true, input: InputKind::Command, history: None }
    }
}

/// An atomic, invertible batch of steps plus the selection it leaves behind
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub steps: Vec<Step>,
    /// Resulting selection; mapped from the old one when absent
    pub selection: Option<Selection>,
    pub stored_marks: StoredMarks,
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transform(tr: Transform) -> Self {
        Self { steps: tr.steps, ..Self::default() }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_stored_marks(mut self, stored_marks: StoredMarks) -> Self {
        self.stored_marks = stored_marks;
        self
    }

    pub fn with_input(mut self, input: InputKind) -> Self {
        self.meta.input = input;
        self
    }

    pub fn with_history_action(mut self, action: HistoryAction) -> Self {
        self.meta.history = Some(action);
        self.meta.add_to_history = false;
        self
    }

    pub fn without_history(mut self) -> Self {
        self.meta.add_to_history = false;
        self
    }

    pub fn at_time(mut self, time: u64) -> Self {
        self.meta.time = time;
        self
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Map a position through all steps of this transaction
    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.steps.iter().fold(pos, |pos, step| step.map(pos, assoc))
    }
}
