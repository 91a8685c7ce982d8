use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use storefront_categories::{Category, CategoryPatch, NewCategory, ensure_not_descendant, listing_order};
use storefront_core::{CategoryId, Document, ExpectedVersion};

use super::{ServiceError, ServiceResult};
use crate::store::{DocumentStore, Query, StoreError};

/// Attempts for the denormalized product counter, which is bumped from
/// product writes and may race with category edits.
const PRODUCT_COUNT_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub is_active: Option<bool>,
    pub parent: Option<CategoryId>,
}

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn DocumentStore<Category>>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn DocumentStore<Category>>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input, now), err)]
    pub async fn create(&self, input: NewCategory, now: DateTime<Utc>) -> ServiceResult<Category> {
        let category = Category::create(CategoryId::new(), input, now)?;
        if let Some(parent) = category.parent_category() {
            self.require_parent(parent).await?;
        }

        let stored = self.store.insert(category).await?;
        info!(category_id = %stored.id_typed(), slug = stored.slug(), "category created");
        Ok(stored)
    }

    #[instrument(skip(self, patch, now), err)]
    pub async fn update(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
        now: DateTime<Utc>,
    ) -> ServiceResult<Category> {
        let mut category = self.get(id).await?;

        if let Some(Some(parent)) = patch.parent_category {
            let lineage = self.lineage(parent).await?;
            ensure_not_descendant(id, lineage)?;
        }

        let expected = ExpectedVersion::Exact(category.version());
        category.apply_patch(patch, now)?;
        let stored = self.store.update(category, expected).await?;
        info!(category_id = %id, slug = stored.slug(), version = stored.version(), "category updated");
        Ok(stored)
    }

    pub async fn get(&self, id: CategoryId) -> ServiceResult<Category> {
        debug!(category_id = %id, "loading category");
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("category {id}")))
    }

    /// Categories ordered by sort order, then name.
    pub async fn list(&self, filter: CategoryFilter) -> ServiceResult<Vec<Category>> {
        let query = Query::all()
            .filter_opt("isActive", filter.is_active)
            .filter_opt("parentCategory", filter.parent.map(|p| p.to_string()));
        let mut categories = self.store.find(&query).await?;
        categories.sort_by(listing_order);
        Ok(categories)
    }

    /// Direct children of `id`.
    pub async fn subcategories(&self, id: CategoryId) -> ServiceResult<Vec<Category>> {
        self.get(id).await?;
        self.list(CategoryFilter {
            is_active: None,
            parent: Some(id),
        })
        .await
    }

    /// Child ids of every category that has children, in listing order.
    pub async fn children_index(&self) -> ServiceResult<HashMap<CategoryId, Vec<CategoryId>>> {
        let mut index: HashMap<CategoryId, Vec<CategoryId>> = HashMap::new();
        for category in self.list(CategoryFilter::default()).await? {
            if let Some(parent) = category.parent_category() {
                index.entry(parent).or_default().push(category.id_typed());
            }
        }
        Ok(index)
    }

    /// Shift the denormalized product count, clamped at zero.
    pub async fn adjust_product_count(
        &self,
        id: CategoryId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> ServiceResult<Category> {
        for attempt in 1..=PRODUCT_COUNT_ATTEMPTS {
            let mut category = self.get(id).await?;
            let expected = ExpectedVersion::Exact(category.version());
            category.adjust_product_count(delta, now);

            match self.store.update(category, expected).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::VersionConflict(msg)) => {
                    debug!(category_id = %id, attempt, %msg, "product count update raced, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Exhausted {
            operation: "category product count update",
            attempts: PRODUCT_COUNT_ATTEMPTS,
        })
    }

    /// Fail with a validation error when `id` does not exist.
    pub async fn require_existing(&self, id: CategoryId, field: &str) -> ServiceResult<()> {
        match self.store.get(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::validation(format!(
                "{field} {id} does not exist"
            ))),
        }
    }

    async fn require_parent(&self, parent: CategoryId) -> ServiceResult<()> {
        self.require_existing(parent, "parent category").await
    }

    /// `start` followed by its ancestors, nearest first.
    async fn lineage(&self, start: CategoryId) -> ServiceResult<Vec<CategoryId>> {
        let mut lineage = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = Some(start);

        while let Some(id) = cursor {
            if !seen.insert(id) {
                break;
            }
            let category = match self.store.get(id).await? {
                Some(category) => category,
                None if id == start => {
                    return Err(ServiceError::validation(format!(
                        "parent category {id} does not exist"
                    )));
                }
                None => break,
            };
            lineage.push(id);
            cursor = category.parent_category();
        }
        Ok(lineage)
    }
}
