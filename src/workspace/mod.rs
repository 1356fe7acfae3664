//! Document workspace
//!
//! Owns everything the document list and the editor panel share: the loaded
//! document records, the active document, its editor state, the loading flag
//! and the error signal. It also ties the transaction pipeline to the save
//! scheduler: every document-changing transaction on the active document
//! schedules a save tagged with that document's id.
//!
//! Store calls come in two halves (`begin_*` / `finish_*`) so a host can run
//! the network request without holding the workspace. The `async` methods
//! compose the halves for callers that own the workspace outright.

pub mod loader;

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

use crate::commands::{self, EditorCommand, KeyEvent, Keymap};
use crate::config::EditorConfig;
use crate::decorations::{decorate, Decoration};
use crate::models::editor_state::EditorState;
use crate::models::errors::{ParseError, StepError};
use crate::models::marks::MarkType;
use crate::models::schema::Schema;
use crate::models::selection::Selection;
use crate::models::serde_helpers::serialize;
use crate::persistence::{DocumentRecord, DocumentStore, PendingSave, SaveScheduler, StoreError, NEW_DOCUMENT_TITLE};
use crate::transform::Transaction;

pub use loader::{load_editor_state, LoadedState};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("no document is selected")]
    NoActiveDocument,

    #[error(transparent)]
    Step(#[from] StepError),
}

/// Snapshot handed to the host for rendering
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub document_id: Option<String>,
    pub editable: bool,
    pub selection: Option<Selection>,
    pub decorations: Vec<Decoration>,
    /// Marks on throughout the selection, for toolbar highlighting
    pub active_marks: Vec<MarkType>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub parse_error: Option<String>,
    pub save_pending: bool,
}

pub struct DocumentWorkspace {
    config: EditorConfig,
    keymap: Keymap,
    documents: Vec<DocumentRecord>,
    selected: Option<String>,
    editor: Option<EditorState>,
    scheduler: SaveScheduler,
    /// Saves detached from their document by a switch, waiting to be sent
    detached: VecDeque<PendingSave>,
    /// Content of the save out on the wire, at most one per document
    in_flight: HashMap<String, String>,
    is_loading: bool,
    error: Option<String>,
    last_parse_error: Option<ParseError>,
}

impl DocumentWorkspace {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            keymap: Keymap::default_bindings(config.mac_keys),
            scheduler: SaveScheduler::new(config.debounce_ms),
            config,
            documents: Vec::new(),
            selected: None,
            editor: None,
            detached: VecDeque::new(),
            in_flight: HashMap::new(),
            is_loading: false,
            error: None,
            last_parse_error: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn selected_document(&self) -> Option<&DocumentRecord> {
        let id = self.selected.as_deref()?;
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Editor state of the active document
    pub fn editor(&self) -> Option<&EditorState> {
        self.editor.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Why the active document was opened empty, if it was
    pub fn last_parse_error(&self) -> Option<&ParseError> {
        self.last_parse_error.as_ref()
    }

    pub fn view_state(&self) -> ViewState {
        let placeholder = &self.config.placeholder;
        match &self.editor {
            Some(state) => ViewState {
                document_id: self.selected.clone(),
                editable: true,
                selection: Some(state.selection),
                decorations: decorate(&state.doc, placeholder).iter().cloned().collect(),
                active_marks: MarkType::ALL.into_iter().filter(|&mark| state.is_mark_active(mark)).collect(),
                can_undo: state.can_undo(),
                can_redo: state.can_redo(),
                is_loading: self.is_loading,
                error: self.error.clone(),
                parse_error: self.last_parse_error.as_ref().map(|e| e.to_string()),
                save_pending: self.has_pending_saves(),
            },
            // No active document: a read-only empty placeholder view
            None => ViewState {
                document_id: None,
                editable: false,
                selection: None,
                decorations: decorate(&Schema::new().empty_document(), placeholder).iter().cloned().collect(),
                active_marks: Vec::new(),
                can_undo: false,
                can_redo: false,
                is_loading: self.is_loading,
                error: self.error.clone(),
                parse_error: None,
                save_pending: self.has_pending_saves(),
            },
        }
    }

    /// Stored JSON of the active document
    pub fn document_json(&self) -> Option<String> {
        self.editor.as_ref().map(|state| serialize(&state.doc))
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Make `id` the active document, loading its stored content
    ///
    /// The record holds the latest local content, so a document reopened
    /// before its save went out comes back with its edits. Returns false (and changes nothing) when no loaded record has that id.
    pub fn select_document(&mut self, id: &str) -> bool {
        let Some(record) = self.documents.iter().find(|doc| doc.id == id) else {
            log::debug!("select_document: unknown document {}", id);
            return false;
        };
        if self.selected.as_deref() == Some(id) {
            return true;
        }
        let loaded = load_editor_state(Some(record.content.as_str()), &self.config);

        self.detach_pending(Some(id));
        self.editor = Some(loaded.state);
        self.last_parse_error = loaded.parse_error;
        self.selected = Some(id.to_string());
        log::info!("selected document {}", id);
        true
    }

    /// Leave the editor without an active document
    pub fn clear_selection(&mut self) {
        self.detach_pending(None);
        self.selected = None;
        self.editor = None;
        self.last_parse_error = None;
    }

    /// Move any pending save not belonging to `next` out of the scheduler
    fn detach_pending(&mut self, next: Option<&str>) {
        let Some(pending) = self.scheduler.retarget(next) else {
            return;
        };
        if self.config.flush_on_switch {
            log::debug!("flushing pending save for {}", pending.document_id);
            // An older detached save for the same document is superseded
            self.detached.retain(|save| save.document_id != pending.document_id);
            self.detached.push_back(pending);
        } else {
            log::info!("dropping pending save for {}", pending.document_id);
        }
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Apply `tr` to the active document and schedule a save if it changed
    ///
    /// A failing transaction leaves the editor state untouched.
    pub fn dispatch(&mut self, tr: &Transaction, now: u64) -> Result<(), WorkspaceError> {
        let (Some(state), Some(id)) = (&self.editor, &self.selected) else {
            return Err(WorkspaceError::NoActiveDocument);
        };
        let next = state.apply(tr)?;
        if tr.doc_changed() {
            let content = serialize(&next.doc);
            if let Some(record) = self.documents.iter_mut().find(|doc| &doc.id == id) {
                record.content = content.clone();
            }
            self.detached.retain(|save| &save.document_id != id);
            self.scheduler.schedule(id, content, now);
        }
        self.editor = Some(next);
        Ok(())
    }

    /// Run `command` against the active document
    ///
    /// Returns whether the command applied. Every command is refused while no
    /// document is selected.
    pub fn execute(&mut self, command: &EditorCommand, now: u64) -> bool {
        let Some(state) = &self.editor else {
            return false;
        };
        let Some(tr) = commands::run(command, state) else {
            return false;
        };
        match self.dispatch(&tr.at_time(now), now) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("{:?} refused: {}", command, err);
                false
            }
        }
    }

    /// Run the command bound to `event`; false when unbound or refused
    pub fn handle_key(&mut self, event: &KeyEvent, now: u64) -> bool {
        match self.keymap.lookup(event).cloned() {
            Some(command) => self.execute(&command, now),
            None => false,
        }
    }

    /// Move the selection of the active document
    pub fn set_selection(&mut self, anchor: usize, head: usize, now: u64) -> bool {
        let tr = Transaction::new().with_selection(Selection::new(anchor, head)).at_time(now);
        self.dispatch(&tr, now).is_ok()
    }

    // ========================================================================
    // Saves
    // ========================================================================

    /// Next save ready to be sent
    ///
    /// Saves detached by a document switch go first, then the scheduled save
    /// once its quiet period has passed. A document whose previous save has
    /// not finished yet is skipped until `finish_save` is called for it. The
    /// returned save counts as in flight.
    pub fn take_due_save(&mut self, now: u64) -> Option<PendingSave> {
        let save = match self.detached.iter().position(|save| !self.in_flight.contains_key(&save.document_id)) {
            Some(index) => self.detached.remove(index),
            None if self.scheduled_blocked() => None,
            None => self.scheduler.take_due(now),
        }?;
        self.in_flight.insert(save.document_id.clone(), save.content.clone());
        Some(save)
    }

    /// Every outstanding save that can go out now, due or not
    ///
    /// Saves for documents with a save still in flight stay queued.
    pub fn flush_saves(&mut self) -> Vec<PendingSave> {
        let mut saves = Vec::new();
        let mut waiting = VecDeque::new();
        for save in self.detached.drain(..) {
            if self.in_flight.contains_key(&save.document_id) {
                waiting.push_back(save);
            } else {
                saves.push(save);
            }
        }
        self.detached = waiting;
        if !self.scheduled_blocked() {
            saves.extend(self.scheduler.flush());
        }
        for save in &saves {
            self.in_flight.insert(save.document_id.clone(), save.content.clone());
        }
        saves
    }

    /// When the next sendable save becomes due; detached saves are due at once
    ///
    /// Saves held back by an in-flight save are not counted; finishing that
    /// save is what releases them.
    pub fn next_save_due(&self, now: u64) -> Option<u64> {
        if self.detached.iter().any(|save| !self.in_flight.contains_key(&save.document_id)) {
            return Some(now);
        }
        if self.scheduled_blocked() {
            return None;
        }
        self.scheduler.next_due()
    }

    fn scheduled_blocked(&self) -> bool {
        self.scheduler
            .pending()
            .is_some_and(|pending| self.in_flight.contains_key(&pending.document_id))
    }

    pub fn has_pending_saves(&self) -> bool {
        !self.detached.is_empty() || self.scheduler.pending().is_some()
    }

    /// Record the outcome of sending `save`
    ///
    /// Releases the document for its next save. The record already holds the
    /// newest local content, so a finished save never writes content back. A
    /// failure is reported through `error`; the editor state is never rolled
    /// back.
    pub fn finish_save(&mut self, save: &PendingSave, result: Result<(), StoreError>) {
        self.in_flight.remove(&save.document_id);
        self.record_result(&save.document_id, result);
    }

    /// Record the outcome of saving `content` to document `id` directly
    pub fn record_update(&mut self, id: &str, content: &str, result: Result<(), StoreError>) {
        if result.is_ok() {
            if let Some(record) = self.documents.iter_mut().find(|doc| doc.id == id) {
                record.content = content.to_string();
            }
        }
        self.record_result(id, result);
    }

    fn record_result(&mut self, id: &str, result: Result<(), StoreError>) {
        match result {
            Ok(()) => self.error = None,
            Err(err) => {
                log::error!("saving document {} failed: {}", id, err);
                self.error = Some(format!("Failed to update document: {}", err));
            }
        }
    }

    /// Newest content not yet confirmed by the store for `id`
    fn unsaved_content(&self, id: &str) -> Option<String> {
        if let Some(pending) = self.scheduler.pending().filter(|pending| pending.document_id == id) {
            return Some(pending.content.clone());
        }
        if let Some(save) = self.detached.iter().rev().find(|save| save.document_id == id) {
            return Some(save.content.clone());
        }
        self.in_flight.get(id).cloned()
    }

    /// Save `content` to document `id` right away
    pub async fn update_document(
        &mut self,
        store: &dyn DocumentStore,
        id: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        let result = store.update_document(id, content).await;
        self.record_update(id, content, result.clone());
        result
    }

    /// Send every outstanding save
    pub async fn flush(&mut self, store: &dyn DocumentStore) {
        for save in self.flush_saves() {
            let result = store.update_document(&save.document_id, &save.content).await;
            self.finish_save(&save, result);
        }
    }

    // ========================================================================
    // Document list
    // ========================================================================

    pub fn begin_load(&mut self) {
        self.is_loading = true;
    }

    /// Apply the outcome of listing documents
    ///
    /// Keeps the active document when it is still listed, clears it when it is
    /// gone, and selects the first document when nothing is selected.
    pub fn finish_load(&mut self, result: Result<Vec<DocumentRecord>, StoreError>) {
        self.is_loading = false;
        let documents = match result {
            Ok(documents) => documents,
            Err(err) => {
                log::error!("loading documents failed: {}", err);
                self.error = Some(format!("Failed to fetch documents: {}", err));
                return;
            }
        };
        self.error = None;
        self.documents = documents;
        // A listing can predate saves that have not gone out yet
        for index in 0..self.documents.len() {
            if let Some(content) = self.unsaved_content(&self.documents[index].id) {
                self.documents[index].content = content;
            }
        }
        log::info!("loaded {} documents", self.documents.len());

        if let Some(id) = self.selected.clone() {
            if !self.documents.iter().any(|doc| doc.id == id) {
                self.clear_selection();
            }
        }
        if self.selected.is_none() {
            if let Some(first) = self.documents.first().map(|doc| doc.id.clone()) {
                self.select_document(&first);
            }
        }
    }

    /// Reload the document list
    pub async fn refresh(&mut self, store: &dyn DocumentStore) -> Result<(), StoreError> {
        self.begin_load();
        let result = list_with_retries(store, self.config.load_retries).await;
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.finish_load(result);
        outcome
    }

    /// Add a created record and make it the active document
    pub fn finish_create(&mut self, result: Result<DocumentRecord, StoreError>) -> Option<DocumentRecord> {
        match result {
            Ok(record) => {
                let id = record.id.clone();
                self.documents.push(record.clone());
                self.select_document(&id);
                Some(record)
            }
            Err(err) => {
                log::error!("creating document failed: {}", err);
                self.error = Some(format!("Failed to create document: {}", err));
                None
            }
        }
    }

    pub async fn create_document(&mut self, store: &dyn DocumentStore) -> Result<DocumentRecord, StoreError> {
        let result = store.create_document(NEW_DOCUMENT_TITLE, "").await;
        let outcome = result.clone();
        self.finish_create(result);
        outcome
    }

    /// Drop a deleted record along with any save still aimed at it
    pub fn finish_delete(&mut self, id: &str, result: Result<(), StoreError>) {
        if let Err(err) = result {
            log::error!("deleting document {} failed: {}", id, err);
            self.error = Some(format!("Failed to delete document: {}", err));
            return;
        }
        self.documents.retain(|doc| doc.id != id);
        self.detached.retain(|save| save.document_id != id);
        self.in_flight.remove(id);
        if self.selected.as_deref() == Some(id) {
            self.scheduler.cancel();
            self.clear_selection();
            if let Some(first) = self.documents.first().map(|doc| doc.id.clone()) {
                self.select_document(&first);
            }
        }
    }

    pub async fn delete_document(&mut self, store: &dyn DocumentStore, id: &str) -> Result<(), StoreError> {
        let result = store.delete_document(id).await;
        self.finish_delete(id, result.clone());
        result
    }

    /// Shut the workspace down; unsent saves are discarded
    pub fn teardown(&mut self) {
        let dropped = self.detached.len() + usize::from(self.scheduler.cancel().is_some());
        if dropped > 0 {
            log::warn!("teardown discarded {} unsent save(s)", dropped);
        }
        self.detached.clear();
        self.in_flight.clear();
        self.selected = None;
        self.editor = None;
        self.last_parse_error = None;
    }
}

/// List documents, retrying transient failures up to `retries` times
pub async fn list_with_retries(store: &dyn DocumentStore, retries: u32) -> Result<Vec<DocumentRecord>, StoreError> {
    let mut attempt = 0;
    loop {
        match store.list_documents().await {
            Err(err) if err.is_transient() && attempt < retries => {
                attempt += 1;
                log::warn!("listing documents failed ({}), retry {}/{}", err, attempt, retries);
            }
            result => return result,
        }
    }
}
