use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::field::{double_option, limit_text, require_text};
use storefront_core::{CategoryId, Document, DomainError, DomainResult, UniqueKey};

use crate::slug::derive_slug;

pub const NAME_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 500;

/// Category document.
///
/// The parent link is stored; children are found by querying for categories
/// whose `parentCategory` equals this id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    id: CategoryId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    slug: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    parent_category: Option<CategoryId>,
    is_active: bool,
    sort_order: i32,
    product_count: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

/// Input of `Category::create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_category: Option<CategoryId>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update. `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_category: Option<Option<CategoryId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Validated name and its slug.
fn name_and_slug(raw: &str) -> DomainResult<(String, String)> {
    let name = require_text("name", raw, NAME_MAX)?;
    let slug = derive_slug(&name);
    if slug.is_empty() {
        return Err(DomainError::validation(
            "name must contain at least one ASCII letter or digit",
        ));
    }
    Ok((name, slug))
}

fn description(raw: Option<&str>) -> DomainResult<Option<String>> {
    raw.map(|d| limit_text("description", d, DESCRIPTION_MAX))
        .transpose()
}

impl Category {
    /// Validate the input and build a new category (version 0, not yet stored).
    ///
    /// Whether `parent_category` exists is checked by the caller.
    pub fn create(id: CategoryId, input: NewCategory, now: DateTime<Utc>) -> DomainResult<Self> {
        let (name, slug) = name_and_slug(input.name.as_deref().unwrap_or(""))?;
        let description = description(input.description.as_deref())?;

        Ok(Self {
            id,
            name,
            description,
            slug,
            image: input.image,
            icon: input.icon,
            parent_category: input.parent_category,
            is_active: input.is_active.unwrap_or(true),
            sort_order: input.sort_order.unwrap_or(0),
            product_count: 0,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Apply a partial update. Validates everything before mutating, so a
    /// failed patch leaves the category unchanged.
    ///
    /// Rejects self-parenting; descendant checks need the stored hierarchy and
    /// go through [`ensure_not_descendant`].
    pub fn apply_patch(&mut self, patch: CategoryPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let renamed = patch.name.as_deref().map(name_and_slug).transpose()?;
        let description = match patch.description {
            Some(d) => Some(description(d.as_deref())?),
            None => None,
        };
        if let Some(Some(parent)) = patch.parent_category {
            if parent == self.id {
                return Err(DomainError::validation("a category cannot be its own parent"));
            }
        }

        if let Some((name, slug)) = renamed {
            self.name = name;
            self.slug = slug;
        }
        if let Some(d) = description {
            self.description = d;
        }
        if let Some(parent) = patch.parent_category {
            self.parent_category = parent;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(icon) = patch.icon {
            self.icon = icon;
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Shift the denormalized product count, clamping at zero.
    pub fn adjust_product_count(&mut self, delta: i64, now: DateTime<Utc>) {
        let next = (self.product_count as i64).saturating_add(delta);
        self.product_count = next.max(0) as u64;
        self.updated_at = now;
    }

    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn parent_category(&self) -> Option<CategoryId> {
        self.parent_category
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn sort_order(&self) -> i32 {
        self.sort_order
    }

    pub fn product_count(&self) -> u64 {
        self.product_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Document for Category {
    type Id = CategoryId;

    const COLLECTION: &'static str = "categories";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![
            UniqueKey::new("name", self.name.clone()),
            UniqueKey::new("slug", self.slug.clone()),
        ]
    }
}

/// Reject moving `category` under `new_parent` when that would create a cycle.
///
/// `lineage` is the new parent followed by its ancestors, nearest first.
pub fn ensure_not_descendant(
    category: CategoryId,
    lineage: impl IntoIterator<Item = CategoryId>,
) -> DomainResult<()> {
    if lineage.into_iter().any(|ancestor| ancestor == category) {
        return Err(DomainError::validation(
            "a category cannot be moved under itself or one of its descendants",
        ));
    }
    Ok(())
}

/// Ordering used by category listings: sort order ascending, then name.
pub fn listing_order(a: &Category, b: &Category) -> core::cmp::Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.name.cmp(&b.name))
}
