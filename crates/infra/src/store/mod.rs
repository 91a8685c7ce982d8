//! Document persistence.
//!
//! A [`DocumentStore`] keeps one collection of [`Document`]s. Every write is
//! version-checked against an [`ExpectedVersion`] and the collection enforces
//! the unique keys each document declares.

mod in_memory;
mod postgres;
pub mod query;

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use storefront_core::{Document, ExpectedVersion};

pub use in_memory::InMemoryDocumentStore;
pub use postgres::{PostgresDocumentStore, ensure_schema};
pub use query::{Query, SortDirection};

/// Document store operation error.
///
/// Infrastructure failures only; domain validation happens before the store
/// is called.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another document in the collection already holds this unique value.
    #[error("{collection}.{field} '{value}' already exists")]
    UniqueViolation {
        collection: &'static str,
        field: String,
        value: String,
    },

    /// The stored revision does not match the writer's expectation.
    #[error("optimistic concurrency check failed: {0}")]
    VersionConflict(String),

    #[error("{collection} document {id} not found")]
    NotFound { collection: &'static str, id: Uuid },

    #[error("document (de)serialization failed: {0}")]
    Serialization(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Single-collection document store.
#[async_trait::async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    /// Persist a new document at version 1 and return it.
    async fn insert(&self, doc: D) -> Result<D, StoreError>;

    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError>;

    async fn find(&self, query: &Query) -> Result<Vec<D>, StoreError>;

    /// Replace a stored document, bumping its version by one.
    async fn update(&self, doc: D, expected: ExpectedVersion) -> Result<D, StoreError>;
}

#[async_trait::async_trait]
impl<D, S> DocumentStore<D> for Arc<S>
where
    D: Document,
    S: DocumentStore<D> + ?Sized,
{
    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        (**self).insert(doc).await
    }

    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError> {
        (**self).get(id).await
    }

    async fn find(&self, query: &Query) -> Result<Vec<D>, StoreError> {
        (**self).find(query).await
    }

    async fn update(&self, doc: D, expected: ExpectedVersion) -> Result<D, StoreError> {
        (**self).update(doc, expected).await
    }
}

pub(crate) fn to_body<D: Document>(doc: &D) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(doc).map_err(|e| {
        StoreError::Serialization(format!("{} document {}: {e}", D::COLLECTION, doc.id()))
    })
}

pub(crate) fn from_body<D: Document>(body: serde_json::Value) -> Result<D, StoreError> {
    serde_json::from_value(body)
        .map_err(|e| StoreError::Serialization(format!("{} document: {e}", D::COLLECTION)))
}
