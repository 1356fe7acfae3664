//! Models module for the document editor
//!
//! This module contains the schema, the immutable document tree and the
//! editor state built on top of it.

pub mod errors;
pub mod marks;
pub mod schema;
pub mod node;
pub mod serde_helpers;
pub mod selection;
pub mod editor_state;

// Re-export commonly used types
pub use errors::{ParseError, SchemaViolation, StepError};
pub use marks::{MarkSet, MarkType};
pub use schema::{NodeType, Schema};
pub use node::{Node, NodeAttrs, ResolvedPos};
pub use selection::Selection;
pub use editor_state::EditorState;
