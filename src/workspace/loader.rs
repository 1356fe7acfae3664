//! Seeding editor states from stored content

use crate::config::EditorConfig;
use crate::models::editor_state::EditorState;
use crate::models::errors::ParseError;
use crate::models::schema::Schema;
use crate::models::serde_helpers::deserialize;
use crate::undo::UndoStack;

/// A freshly loaded editor state
#[derive(Clone, Debug)]
pub struct LoadedState {
    pub state: EditorState,
    /// Why the stored content was replaced by an empty document
    pub parse_error: Option<ParseError>,
}

/// Build a fresh editor state (new history) from a record's stored content
///
/// Missing or blank content yields the empty document. Content that fails to
/// parse or does not fit the schema also yields the empty document, with the
/// failure logged and returned.
pub fn load_editor_state(content: Option<&str>, config: &EditorConfig) -> LoadedState {
    let schema = Schema::new();
    let history = UndoStack::new(config.history_depth, config.group_delay_ms);

    let content = match content.map(str::trim) {
        Some(content) if !content.is_empty() => content,
        _ => {
            return LoadedState { state: EditorState::empty(schema).with_history(history), parse_error: None };
        }
    };

    match deserialize(&schema, content) {
        Ok(doc) => LoadedState { state: EditorState::new(schema, doc).with_history(history), parse_error: None },
        Err(err) => {
            log::warn!("stored document could not be loaded, starting empty: {}", err);
            LoadedState { state: EditorState::empty(schema).with_history(history), parse_error: Some(err) }
        }
    }
}
