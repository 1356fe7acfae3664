//! WASM exports for the editor host
//!
//! The workspace lives in a process-wide mutex. Calls that reach the network
//! take what they need out of the workspace, release the lock, await the
//! request and lock again to record the outcome; the lock is never held
//! across an `.await`.
//!
//! Saves are driven by a single browser timer. Whenever the set of pending
//! saves changes the timer is cleared and armed again for the earliest due
//! save.

use lazy_static::lazy_static;
use std::sync::Mutex;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use super::helpers::{deserialize, js_error, lock, now_ms, serialize};
use crate::commands::{EditorCommand, KeyEvent, ToolbarAction};
use crate::config::EditorConfig;
use crate::persistence::{DocumentStore, FetchStore, NEW_DOCUMENT_TITLE};
use crate::workspace::{list_with_retries, DocumentWorkspace};
use crate::{wasm_error, wasm_info, wasm_log, wasm_warn};

#[derive(Default)]
struct Session {
    token: Option<String>,
    timer: Option<i32>,
}

// WASM-owned workspace (source of truth for the editor panel)
lazy_static! {
    static ref WORKSPACE: Mutex<Option<DocumentWorkspace>> = Mutex::new(None);
    static ref SESSION: Mutex<Session> = Mutex::new(Session::default());
}

/// Run `f` against the initialized workspace
fn with_workspace<R>(f: impl FnOnce(&mut DocumentWorkspace) -> R) -> Result<R, JsValue> {
    let mut guard = lock(&WORKSPACE, "workspace")?;
    let workspace = guard
        .as_mut()
        .ok_or_else(|| JsValue::from_str("Editor not initialized; call initEditor first"))?;
    Ok(f(workspace))
}

/// Store for the current configuration and session token
fn store() -> Result<FetchStore, JsValue> {
    let url = with_workspace(|ws| ws.config().documents_url())?;
    let token = lock(&SESSION, "session")?.token.clone();
    Ok(FetchStore::new(url, token))
}

fn view_state() -> Result<JsValue, JsValue> {
    let view = with_workspace(|ws| ws.view_state())?;
    serialize(&view, "View state serialization error")
}

// ============================================================================
// Save timer
// ============================================================================

fn clear_timer(session: &mut Session) {
    if let Some(handle) = session.timer.take() {
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(handle);
        }
    }
}

/// Arm the timer for the earliest pending save, replacing any armed timer
fn rearm_timer() -> Result<(), JsValue> {
    let now = now_ms();
    let due = with_workspace(|ws| ws.next_save_due(now))?;

    let mut session = lock(&SESSION, "session")?;
    clear_timer(&mut session);
    let Some(due) = due else {
        return Ok(());
    };

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))?;
    let delay = i32::try_from(due.saturating_sub(now)).unwrap_or(i32::MAX);
    let callback = Closure::once_into_js(|| spawn_local(send_due_saves()));
    let handle = window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref::<js_sys::Function>(), delay)?;
    session.timer = Some(handle);
    Ok(())
}

/// Timer callback: send every save that is due, then re-arm
async fn send_due_saves() {
    if let Ok(mut session) = lock(&SESSION, "session") {
        session.timer = None;
    }

    loop {
        let Ok(store) = store() else {
            break;
        };
        let now = now_ms();
        // Documents with a save still out are held back until it finishes
        let Ok(Some(save)) = with_workspace(|ws| ws.take_due_save(now)) else {
            break;
        };
        wasm_log!("saving document {} ({} bytes)", save.document_id, save.content.len());
        let result = store.update_document(&save.document_id, &save.content).await;
        if let Err(err) = &result {
            wasm_warn!("save of {} failed: {}", save.document_id, err);
        }
        // A workspace torn down meanwhile just ignores the outcome
        if with_workspace(|ws| ws.finish_save(&save, result)).is_err() {
            return;
        }
    }

    if let Err(err) = rearm_timer() {
        wasm_error!("re-arming save timer failed: {:?}", err);
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Create the editor workspace
///
/// # Parameters
/// - `config_js`: partial `EditorConfig` object, or `undefined` for defaults
#[wasm_bindgen(js_name = initEditor)]
pub fn init_editor(config_js: JsValue) -> Result<(), JsValue> {
    let config = if config_js.is_undefined() || config_js.is_null() {
        EditorConfig::default()
    } else {
        let config: EditorConfig = deserialize(config_js, "Config deserialization error")?;
        config.validate().map_err(|e| js_error("Invalid config", e))?
    };
    wasm_info!("initEditor: api={}, debounce={}ms", config.api_base_url, config.debounce_ms);

    clear_timer(&mut *lock(&SESSION, "session")?);
    let mut guard = lock(&WORKSPACE, "workspace")?;
    if let Some(previous) = guard.as_mut() {
        previous.teardown();
    }
    *guard = Some(DocumentWorkspace::new(config));
    Ok(())
}

/// Set (or clear) the bearer token sent with every request
#[wasm_bindgen(js_name = setAuthToken)]
pub fn set_auth_token(token: Option<String>) -> Result<(), JsValue> {
    lock(&SESSION, "session")?.token = token;
    Ok(())
}

/// Drop the workspace; unsent saves are discarded and the timer cleared
#[wasm_bindgen(js_name = teardownEditor)]
pub fn teardown_editor() -> Result<(), JsValue> {
    clear_timer(&mut *lock(&SESSION, "session")?);
    let mut guard = lock(&WORKSPACE, "workspace")?;
    if let Some(mut workspace) = guard.take() {
        workspace.teardown();
        wasm_info!("teardownEditor: workspace released");
    }
    Ok(())
}

// ============================================================================
// Document list
// ============================================================================

/// Fetch the document list; resolves to the new view state
#[wasm_bindgen(js_name = loadDocuments)]
pub async fn load_documents() -> Result<JsValue, JsValue> {
    let retries = with_workspace(|ws| {
        ws.begin_load();
        ws.config().load_retries
    })?;
    let store = store()?;
    let result = list_with_retries(&store, retries).await;
    if let Err(err) = &result {
        wasm_error!("loadDocuments failed: {}", err);
    }
    with_workspace(|ws| ws.finish_load(result))?;
    rearm_timer()?;
    view_state()
}

/// Create an empty document and select it; resolves to the new record
#[wasm_bindgen(js_name = createDocument)]
pub async fn create_document() -> Result<JsValue, JsValue> {
    let store = store()?;
    let result = store.create_document(NEW_DOCUMENT_TITLE, "").await;
    let record = with_workspace(|ws| ws.finish_create(result))?;
    rearm_timer()?;
    match record {
        Some(record) => serialize(&record, "Document serialization error"),
        None => Err(JsValue::from_str("Failed to create document")),
    }
}

#[wasm_bindgen(js_name = deleteDocument)]
pub async fn delete_document(id: String) -> Result<JsValue, JsValue> {
    let store = store()?;
    let result = store.delete_document(&id).await;
    with_workspace(|ws| ws.finish_delete(&id, result))?;
    rearm_timer()?;
    view_state()
}

/// Make `id` the active document; false when no loaded document has that id
#[wasm_bindgen(js_name = selectDocument)]
pub fn select_document(id: &str) -> Result<bool, JsValue> {
    let selected = with_workspace(|ws| ws.select_document(id))?;
    rearm_timer()?;
    Ok(selected)
}

#[wasm_bindgen(js_name = clearSelection)]
pub fn clear_selection() -> Result<(), JsValue> {
    with_workspace(|ws| ws.clear_selection())?;
    rearm_timer()
}

/// Save `content` to document `id` immediately, bypassing the debounce window
#[wasm_bindgen(js_name = updateDocument)]
pub async fn update_document(id: String, content: String) -> Result<(), JsValue> {
    let store = store()?;
    let result = store.update_document(&id, &content).await;
    let outcome = result.clone().map_err(|e| js_error("Failed to update document", e));
    with_workspace(|ws| ws.record_update(&id, &content, result))?;
    outcome
}

/// Send every outstanding save now
#[wasm_bindgen(js_name = flushSave)]
pub async fn flush_save() -> Result<(), JsValue> {
    clear_timer(&mut *lock(&SESSION, "session")?);
    let saves = with_workspace(|ws| ws.flush_saves())?;
    let store = store()?;
    for save in saves {
        let result = store.update_document(&save.document_id, &save.content).await;
        with_workspace(|ws| ws.finish_save(&save, result))?;
    }
    // Saves waiting on one already in flight go out with the timer
    rearm_timer()
}

// ============================================================================
// Editing
// ============================================================================

fn execute(command: &EditorCommand) -> Result<bool, JsValue> {
    let applied = with_workspace(|ws| ws.execute(command, now_ms()))?;
    if applied {
        rearm_timer()?;
    }
    Ok(applied)
}

/// Run an `EditorCommand` (`{command: "toggleMark", mark: "strong"}`, ...)
///
/// # Returns
/// Whether the command applied
#[wasm_bindgen(js_name = runCommand)]
pub fn run_command(command_js: JsValue) -> Result<bool, JsValue> {
    let command: EditorCommand = deserialize(command_js, "Command deserialization error")?;
    wasm_log!("runCommand: {:?}", command);
    execute(&command)
}

/// Run a toolbar button (`{action: "heading", level: 2}`, ...)
#[wasm_bindgen(js_name = runToolbarAction)]
pub fn run_toolbar_action(action_js: JsValue) -> Result<bool, JsValue> {
    let action: ToolbarAction = deserialize(action_js, "Toolbar action deserialization error")?;
    execute(&action.command())
}

/// Run the command bound to a key event
///
/// # Returns
/// Whether a bound command applied; the host should `preventDefault` when true
#[wasm_bindgen(js_name = handleKey)]
pub fn handle_key(event_js: JsValue) -> Result<bool, JsValue> {
    let event: KeyEvent = deserialize(event_js, "Key event deserialization error")?;
    let applied = with_workspace(|ws| ws.handle_key(&event, now_ms()))?;
    if applied {
        rearm_timer()?;
    }
    Ok(applied)
}

#[wasm_bindgen(js_name = insertText)]
pub fn insert_text(text: String) -> Result<bool, JsValue> {
    execute(&EditorCommand::InsertText { text })
}

#[wasm_bindgen(js_name = setSelection)]
pub fn set_selection(anchor: usize, head: usize) -> Result<bool, JsValue> {
    with_workspace(|ws| ws.set_selection(anchor, head, now_ms()))
}

// ============================================================================
// Queries
// ============================================================================

/// Current view state (selection, decorations, history and save flags)
#[wasm_bindgen(js_name = getViewState)]
pub fn get_view_state() -> Result<JsValue, JsValue> {
    view_state()
}

/// Stored JSON of the active document, or `undefined` when none is selected
#[wasm_bindgen(js_name = getDocumentJson)]
pub fn get_document_json() -> Result<Option<String>, JsValue> {
    with_workspace(|ws| ws.document_json())
}
