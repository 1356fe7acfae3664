//! Persistence bridge: debounced saves and the document store clients

pub mod http;
pub mod memory;
pub mod scheduler;
pub mod store;

pub use http::FetchStore;
pub use memory::MemoryStore;
pub use scheduler::{PendingSave, SaveScheduler};
pub use store::{DocumentRecord, DocumentStore, StoreError, NEW_DOCUMENT_TITLE};
