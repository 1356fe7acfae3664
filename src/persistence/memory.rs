//! In-process document store
//!
//! Backs offline sessions and tests. Every update call is recorded, and
//! failures can be queued to exercise error paths.

use async_trait::async_trait;
use chrono::Utc;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::store::{DocumentRecord, DocumentStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RefCell<Vec<DocumentRecord>>,
    updates: RefCell<Vec<(String, String)>>,
    failures: RefCell<VecDeque<StoreError>>,
    next_id: Cell<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<DocumentRecord>) -> Self {
        let store = Self::new();
        *store.documents.borrow_mut() = documents;
        store
    }

    /// Make the next store call fail with `error`
    pub fn fail_next(&self, error: StoreError) {
        self.failures.borrow_mut().push_back(error);
    }

    /// `(id, content)` of every update call, successful or not, in call order
    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates.borrow().clone()
    }

    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.documents.borrow().clone()
    }

    pub fn content_of(&self, id: &str) -> Option<String> {
        self.documents.borrow().iter().find(|doc| doc.id == id).map(|doc| doc.content.clone())
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.failures.borrow_mut().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait(?Send)]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        self.check_failure()?;
        Ok(self.documents())
    }

    async fn get_document(&self, id: &str) -> Result<DocumentRecord, StoreError> {
        self.check_failure()?;
        self.documents
            .borrow()
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create_document(&self, title: &str, content: &str) -> Result<DocumentRecord, StoreError> {
        self.check_failure()?;
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let now = Utc::now();
        let mut record = DocumentRecord::new(format!("mem-{}", id), title, content);
        record.created_at = Some(now);
        record.updated_at = Some(now);
        self.documents.borrow_mut().push(record.clone());
        Ok(record)
    }

    async fn update_document(&self, id: &str, content: &str) -> Result<(), StoreError> {
        self.updates.borrow_mut().push((id.to_string(), content.to_string()));
        self.check_failure()?;
        let mut documents = self.documents.borrow_mut();
        let record = documents
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.content = content.to_string();
        record.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<(), StoreError> {
        self.check_failure()?;
        let mut documents = self.documents.borrow_mut();
        let before = documents.len();
        documents.retain(|doc| doc.id != id);
        if documents.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_create_update_delete() {
        let store = MemoryStore::new();
        let record = block_on(store.create_document("New Document", "")).unwrap();
        assert_eq!(record.id, "mem-1");
        assert!(record.created_at.is_some());

        block_on(store.update_document("mem-1", "{}")).unwrap();
        assert_eq!(store.content_of("mem-1"), Some("{}".to_string()));
        assert_eq!(store.updates(), vec![("mem-1".to_string(), "{}".to_string())]);

        block_on(store.delete_document("mem-1")).unwrap();
        assert!(block_on(store.list_documents()).unwrap().is_empty());
        assert_eq!(block_on(store.get_document("mem-1")), Err(StoreError::NotFound("mem-1".to_string())));
    }

    #[test]
    fn test_queued_failures() {
        let store = MemoryStore::with_documents(vec![DocumentRecord::new("a", "A", "")]);
        store.fail_next(StoreError::Network("offline".into()));
        assert_eq!(block_on(store.list_documents()), Err(StoreError::Network("offline".into())));
        assert_eq!(block_on(store.list_documents()).unwrap().len(), 1);

        store.fail_next(StoreError::Server { status: 500, message: "boom".into() });
        assert!(block_on(store.update_document("a", "x")).is_err());
        // The failed call is still recorded, the record is not changed
        assert_eq!(store.updates().len(), 1);
        assert_eq!(store.content_of("a"), Some(String::new()));
    }
}
