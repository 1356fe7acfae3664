//! Error types for the editing core
//!
//! Schema violations and step failures are contained inside the editor (the
//! offending step is refused), parse failures are recovered by substituting an
//! empty document. None of them ever reach the persistence layer.

use thiserror::Error;

use super::marks::MarkType;
use super::schema::NodeType;

/// A node or mark combination the schema does not declare
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("{child} is not allowed inside {parent}")]
    DisallowedChild { parent: NodeType, child: NodeType },

    #[error("content of {0} does not match its content model")]
    ContentMismatch(NodeType),

    #[error("mark {mark} is not allowed inside {parent}")]
    DisallowedMark { parent: NodeType, mark: MarkType },

    #[error("{0} cannot carry marks")]
    MarkedBlock(NodeType),

    #[error("invalid attributes for {0}")]
    InvalidAttrs(NodeType),

    #[error("empty text node")]
    EmptyText,

    #[error("document root must be doc, found {0}")]
    InvalidRoot(NodeType),
}

/// Failure to apply a step to a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("schema violation: {0}")]
    SchemaViolation(#[from] SchemaViolation),

    #[error("position {pos} out of range (content size {size})")]
    OutOfRange { pos: usize, size: usize },

    #[error("invalid range {from}..{to}")]
    InvalidRange { from: usize, to: usize },

    #[error("range {from}..{to} does not share a parent node")]
    MismatchedParents { from: usize, to: usize },

    #[error("no textblock at position {0}")]
    NotTextblock(usize),
}

/// Stored content that cannot be turned into a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("malformed node: {0}")]
    Malformed(String),

    #[error("schema violation: {0}")]
    Schema(#[from] SchemaViolation),
}
