//! Utility modules for the editor
//!
//! This module contains small helpers shared by the document model and the
//! command layer.

pub mod text;

// Re-export commonly used helpers
pub use text::*;
