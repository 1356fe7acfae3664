//! Document Editor WASM Module
//!
//! Rich-text editing core for the document editor front end: schema and
//! immutable document tree, editing commands, the transaction pipeline with
//! undo/redo, placeholder decorations, and debounced persistence of the active
//! document to the remote document API.

pub mod api;
pub mod commands;
pub mod config;
pub mod decorations;
pub mod models;
pub mod persistence;
pub mod transform;
pub mod undo;
pub mod utils;
pub mod workspace;

// Re-export commonly used types
pub use commands::{EditorCommand, KeyEvent, Keymap, ToolbarAction};
pub use config::EditorConfig;
pub use decorations::{decorate, Decoration, DecorationSet};
pub use models::{EditorState, MarkSet, MarkType, Node, NodeAttrs, NodeType, Schema, Selection};
pub use transform::{Step, Transaction};
pub use workspace::DocumentWorkspace;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    {
        if let Err(err) = console_log::init_with_level(log::Level::Debug) {
            crate::wasm_warn!("logger already initialized: {}", err);
        }
    }

    log::info!("Document editor WASM module initialized");
}
