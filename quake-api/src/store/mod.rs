//! Document store access
//!
//! The query service only sees the `EventStore` trait. Two implementations
//! exist: `SqliteStore` for the persisted log and `MemoryStore` for tests and
//! fixture-backed runs.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

mod memory;
pub mod predicate;
mod record_id;
mod sqlite;

pub use memory::MemoryStore;
pub use predicate::{Document, Predicate};
pub use record_id::{InvalidRecordId, RecordId, RECORD_ID_LEN};
pub use sqlite::SqliteStore;

/// Key holding the store identifier
pub const ID_FIELD: &str = "_id";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Map a request `order` value: 1 ascending, anything else descending
    pub fn from_order(order: i64) -> Self {
        if order == 1 {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }
}

/// Single-key sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// One `find` call: predicate, sort, skip and limit
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub predicate: Predicate,
    pub sort: Sort,
    pub skip: u64,
    /// `None` returns every matching document
    pub limit: Option<u64>,
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Store query timed out after {0:?}")]
    Timeout(Duration),
}

/// Read-only document store
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Matching documents, sorted, then skipped and limited
    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError>;

    /// First matching document
    async fn find_one(&self, predicate: &Predicate) -> Result<Option<Document>, StoreError>;

    /// Number of matching documents
    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_from_request_value() {
        assert_eq!(SortOrder::from_order(1), SortOrder::Ascending);
        assert_eq!(SortOrder::from_order(-1), SortOrder::Descending);
        assert_eq!(SortOrder::from_order(0), SortOrder::Descending);
    }
}
