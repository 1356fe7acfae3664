//! Transaction pipeline building blocks
//!
//! - `step`: atomic, invertible document steps
//! - `transaction`: step builder and the transaction data passed to `EditorState::apply`

pub mod step;
pub mod transaction;

pub use step::{fragment_size, Step};
pub use transaction::{HistoryAction, InputKind, StoredMarks, Transaction, TransactionMeta, Transform};
