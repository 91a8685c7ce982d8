use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use storefront_core::{Document, ExpectedVersion};

use super::{DocumentStore, Query, StoreError, from_body, to_body};

#[derive(Debug, Default)]
struct Collection {
    /// Serialized bodies keyed by id (UUIDv7, so iteration follows creation).
    docs: BTreeMap<Uuid, (u64, JsonValue)>,
    /// (field, value) -> owning document.
    unique: HashMap<(&'static str, String), Uuid>,
}

/// In-memory document store for tests/dev.
///
/// Documents are kept serialized so reads go through the same JSON path as
/// the Postgres backend.
#[derive(Debug)]
pub struct InMemoryDocumentStore<D> {
    inner: RwLock<Collection>,
    _doc: PhantomData<fn() -> D>,
}

impl<D> InMemoryDocumentStore<D> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collection::default()),
            _doc: PhantomData,
        }
    }
}

impl<D> Default for InMemoryDocumentStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

impl Collection {
    fn check_unique<D: Document>(&self, doc: &D, owner: Uuid) -> Result<(), StoreError> {
        for key in doc.unique_keys() {
            if let Some(existing) = self.unique.get(&(key.field, key.value.clone())) {
                if *existing != owner {
                    return Err(StoreError::UniqueViolation {
                        collection: D::COLLECTION,
                        field: key.field.to_string(),
                        value: key.value,
                    });
                }
            }
        }
        Ok(())
    }

    fn index<D: Document>(&mut self, doc: &D, owner: Uuid) {
        self.unique.retain(|_, id| *id != owner);
        for key in doc.unique_keys() {
            self.unique.insert((key.field, key.value), owner);
        }
    }
}

#[async_trait::async_trait]
impl<D: Document> DocumentStore<D> for InMemoryDocumentStore<D> {
    async fn insert(&self, mut doc: D) -> Result<D, StoreError> {
        let id: Uuid = doc.id().into();
        let mut inner = self.inner.write().map_err(poisoned)?;

        if inner.docs.contains_key(&id) {
            return Err(StoreError::VersionConflict(format!(
                "{} document {id} already exists",
                D::COLLECTION
            )));
        }
        inner.check_unique(&doc, id)?;

        doc.set_version(1);
        let body = to_body(&doc)?;
        inner.index(&doc, id);
        inner.docs.insert(id, (1, body));
        Ok(doc)
    }

    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError> {
        let key: Uuid = id.into();
        let body = {
            let inner = self.inner.read().map_err(poisoned)?;
            inner.docs.get(&key).map(|(_, body)| body.clone())
        };
        body.map(from_body).transpose()
    }

    async fn find(&self, query: &Query) -> Result<Vec<D>, StoreError> {
        let bodies: Vec<JsonValue> = {
            let inner = self.inner.read().map_err(poisoned)?;
            inner
                .docs
                .values()
                .filter(|(_, body)| query.matches(body))
                .map(|(_, body)| body.clone())
                .collect()
        };
        query.apply(bodies).into_iter().map(from_body).collect()
    }

    async fn update(&self, mut doc: D, expected: ExpectedVersion) -> Result<D, StoreError> {
        let id: Uuid = doc.id().into();
        let mut inner = self.inner.write().map_err(poisoned)?;

        let current = inner
            .docs
            .get(&id)
            .map(|(version, _)| *version)
            .ok_or(StoreError::NotFound {
                collection: D::COLLECTION,
                id,
            })?;
        if !expected.matches(current) {
            return Err(StoreError::VersionConflict(format!(
                "{} document {id}: expected {expected:?}, found {current}",
                D::COLLECTION
            )));
        }
        inner.check_unique(&doc, id)?;

        let next = current + 1;
        doc.set_version(next);
        let body = to_body(&doc)?;
        inner.index(&doc, id);
        inner.docs.insert(id, (next, body));
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use storefront_categories::{Category, CategoryPatch, NewCategory};
    use storefront_core::CategoryId;

    use crate::store::SortDirection;

    fn category(name: &str) -> Category {
        Category::create(
            CategoryId::new(),
            NewCategory {
                name: Some(name.to_string()),
                ..NewCategory::default()
            },
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_version_one_and_get_round_trips() {
        let store = InMemoryDocumentStore::<Category>::new();
        let stored = store.insert(category("Books")).await.unwrap();
        assert_eq!(stored.version(), 1);

        let loaded = store.get(stored.id_typed()).await.unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert!(store.get(CategoryId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_keys_are_enforced_across_documents() {
        let store = InMemoryDocumentStore::<Category>::new();
        store.insert(category("Books")).await.unwrap();

        match store.insert(category("Books")).await.unwrap_err() {
            StoreError::UniqueViolation { collection, field, value } => {
                assert_eq!(collection, "categories");
                assert_eq!(field, "name");
                assert_eq!(value, "Books");
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_checks_version_and_releases_old_keys() {
        let store = InMemoryDocumentStore::<Category>::new();
        let mut books = store.insert(category("Books")).await.unwrap();
        let now = Utc::now();

        books
            .apply_patch(
                CategoryPatch {
                    name: Some("Novels".to_string()),
                    ..CategoryPatch::default()
                },
                now,
            )
            .unwrap();
        let stale = books.clone();
        let updated = store.update(books, ExpectedVersion::Exact(1)).await.unwrap();
        assert_eq!(updated.version(), 2);

        match store.update(stale, ExpectedVersion::Exact(1)).await.unwrap_err() {
            StoreError::VersionConflict(_) => {}
            other => panic!("expected version conflict, got {other:?}"),
        }

        // "Books" was released by the rename.
        store.insert(category("Books")).await.unwrap();
    }

    #[tokio::test]
    async fn update_of_unknown_document_is_not_found() {
        let store = InMemoryDocumentStore::<Category>::new();
        match store.update(category("Ghost"), ExpectedVersion::Any).await.unwrap_err() {
            StoreError::NotFound { .. } => {}
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn find_filters_and_sorts() {
        let store = InMemoryDocumentStore::<Category>::new();
        store.insert(category("Zeta")).await.unwrap();
        store.insert(category("Alpha")).await.unwrap();

        let query = Query::all()
            .filter("isActive", true)
            .sort_by("name", SortDirection::Ascending);
        let names: Vec<String> = store
            .find(&query)
            .await
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);

        let none = store.find(&Query::all().filter("slug", "missing")).await.unwrap();
        assert!(none.is_empty());
    }
}
