//! Document records and the store abstraction
//!
//! The workspace talks to the remote document service only through
//! `DocumentStore`. The browser build uses `FetchStore`; offline sessions and
//! tests use `MemoryStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title given to documents created from the editor
pub const NEW_DOCUMENT_TITLE: &str = "New Document";

/// A stored document as the document service returns it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Serialized document JSON; empty for a fresh document
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            user_id: String::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The request never got a response
    #[error("network error: {0}")]
    Network(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Network(_) => true,
            StoreError::Server { status, .. } => *status == 503,
            StoreError::NotFound(_) | StoreError::Decode(_) => false,
        }
    }
}

/// Remote document persistence
///
/// Futures are not `Send`: the browser runs them on its single thread.
#[async_trait(?Send)]
pub trait DocumentStore {
    /// All documents of the current user; an unknown collection is empty
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError>;

    async fn get_document(&self, id: &str) -> Result<DocumentRecord, StoreError>;

    async fn create_document(&self, title: &str, content: &str) -> Result<DocumentRecord, StoreError>;

    async fn update_document(&self, id: &str, content: &str) -> Result<(), StoreError>;

    async fn delete_document(&self, id: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_service_json() {
        let json = r#"{
            "id": "9b2c",
            "title": "Notes",
            "content": "",
            "user_id": "u1",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-02T12:30:00Z"
        }"#;
        let record: DocumentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "9b2c");
        assert_eq!(record.user_id, "u1");
        assert!(record.updated_at > record.created_at);
    }

    #[test]
    fn test_minimal_record() {
        let record: DocumentRecord = serde_json::from_str(r#"{"id":"a"}"#).unwrap();
        assert_eq!(record, DocumentRecord::new("a", "", ""));
    }

    #[test]
    fn test_transient_errors() {
        assert!(StoreError::Network("offline".into()).is_transient());
        assert!(StoreError::Server { status: 503, message: "down".into() }.is_transient());
        assert!(!StoreError::Server { status: 400, message: "bad".into() }.is_transient());
        assert!(!StoreError::NotFound("x".into()).is_transient());
    }
}
