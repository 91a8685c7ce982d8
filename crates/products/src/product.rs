use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::field::{double_option, limit_text, non_negative, require_text, required};
use storefront_core::{
    CategoryId, Document, DomainError, DomainResult, ProductId, ReviewId, UniqueKey, UserId,
};

use crate::images::{ProductImage, apply_primary_image_rule, primary_image};
use crate::ratings::{Ratings, Review, recompute_ratings};
use crate::stock::{StockTarget, Variant, apply_delta, find_option_mut};

pub const NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 2000;
pub const REVIEW_COMMENT_MAX: usize = 500;

/// Name/value pair shown in the product's specification table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub name: String,
    pub value: String,
}

/// Physical dimensions (grams and centimetres).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub free_shipping: bool,
    #[serde(default)]
    pub shipping_cost: f64,
}

/// Product document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
    #[serde(default)]
    description: String,
    price: f64,
    #[serde(default)]
    discount_price: Option<f64>,
    #[serde(default)]
    category: Option<CategoryId>,
    #[serde(default)]
    subcategory: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    sku: String,
    #[serde(default)]
    images: Vec<ProductImage>,
    #[serde(default)]
    specifications: Vec<Specification>,
    #[serde(default)]
    variants: Vec<Variant>,
    stock: i64,
    is_active: bool,
    is_featured: bool,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    ratings: Ratings,
    #[serde(default)]
    reviews: Vec<Review>,
    #[serde(default)]
    dimensions: Option<Dimensions>,
    #[serde(default)]
    shipping_info: ShippingInfo,
    #[serde(default)]
    seller: Option<UserId>,
    #[serde(default)]
    views: u64,
    #[serde(default)]
    sales_count: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

/// Input of `Product::create`. Every field is optional on the wire so that a
/// missing required field surfaces as a validation error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub discount_price: Option<f64>,
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub specifications: Vec<Specification>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    pub stock: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub shipping_info: Option<ShippingInfo>,
    pub seller: Option<UserId>,
}

/// Reduced listing input: image url, name and price only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickProduct {
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Partial update of a product. Activation, views and reviews have their own
/// operations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub discount_price: Option<Option<f64>>,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default, deserialize_with = "double_option")]
    pub subcategory: Option<Option<String>>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ProductImage>>,
    #[serde(default)]
    pub specifications: Option<Vec<Specification>>,
    #[serde(default)]
    pub variants: Option<Vec<Variant>>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub dimensions: Option<Option<Dimensions>>,
    #[serde(default)]
    pub shipping_info: Option<ShippingInfo>,
}

/// Review submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub user: Option<UserId>,
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_verified_purchase: bool,
}

fn normalize_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl Product {
    /// Validate the input and build a new product (version 0, not yet stored).
    ///
    /// Category existence and sku uniqueness are checked by the store.
    pub fn create(id: ProductId, input: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        let product = Self {
            id,
            name: required("name", input.name)?,
            description: require_text(
                "description",
                &required("description", input.description)?,
                DESCRIPTION_MAX,
            )?,
            price: required("price", input.price)?,
            discount_price: input.discount_price,
            category: Some(required("category", input.category)?),
            subcategory: input.subcategory,
            brand: Some(required("brand", input.brand)?),
            sku: required("sku", input.sku)?,
            images: apply_primary_image_rule(input.images),
            specifications: input.specifications,
            variants: input.variants,
            stock: required("stock", input.stock)?,
            is_active: input.is_active.unwrap_or(true),
            is_featured: input.is_featured.unwrap_or(false),
            tags: normalize_tags(input.tags),
            ratings: Ratings::default(),
            reviews: Vec::new(),
            dimensions: input.dimensions,
            shipping_info: input.shipping_info.unwrap_or_default(),
            seller: Some(required("seller", input.seller)?),
            views: 0,
            sales_count: 0,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        product.validated()
    }

    /// Build a product from the reduced listing form.
    ///
    /// The image (if any) becomes the primary image and the sku is derived
    /// from the id.
    pub fn create_quick(id: ProductId, input: QuickProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        let images = input
            .img
            .filter(|url| !url.trim().is_empty())
            .map(|url| vec![ProductImage::new(url)])
            .unwrap_or_default();

        let product = Self {
            id,
            name: required("name", input.name)?,
            description: String::new(),
            price: required("price", input.price)?,
            discount_price: None,
            category: None,
            subcategory: None,
            brand: None,
            sku: format!("SKU-{id}"),
            images: apply_primary_image_rule(images),
            specifications: Vec::new(),
            variants: Vec::new(),
            stock: 0,
            is_active: true,
            is_featured: false,
            tags: BTreeSet::new(),
            ratings: Ratings::default(),
            reviews: Vec::new(),
            dimensions: None,
            shipping_info: ShippingInfo::default(),
            seller: None,
            views: 0,
            sales_count: 0,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        product.validated()
    }

    /// Apply a partial update. The whole candidate is validated before it
    /// replaces the current state; images go through the primary-image rule.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut next = self.clone();

        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(description) = patch.description {
            if description.trim().is_empty() {
                return Err(DomainError::validation("description is required"));
            }
            next.description = description;
        }
        if let Some(price) = patch.price {
            next.price = price;
        }
        if let Some(discount_price) = patch.discount_price {
            next.discount_price = discount_price;
        }
        if let Some(category) = patch.category {
            next.category = Some(category);
        }
        if let Some(subcategory) = patch.subcategory {
            next.subcategory = subcategory;
        }
        if let Some(brand) = patch.brand {
            next.brand = Some(brand);
        }
        if let Some(sku) = patch.sku {
            next.sku = sku;
        }
        if let Some(images) = patch.images {
            next.images = apply_primary_image_rule(images);
        }
        if let Some(specifications) = patch.specifications {
            next.specifications = specifications;
        }
        if let Some(variants) = patch.variants {
            next.variants = variants;
        }
        if let Some(stock) = patch.stock {
            next.stock = stock;
        }
        if let Some(is_featured) = patch.is_featured {
            next.is_featured = is_featured;
        }
        if let Some(tags) = patch.tags {
            next.tags = normalize_tags(tags);
        }
        if let Some(dimensions) = patch.dimensions {
            next.dimensions = dimensions;
        }
        if let Some(shipping_info) = patch.shipping_info {
            next.shipping_info = shipping_info;
        }
        next.updated_at = now;

        *self = next.validated()?;
        Ok(())
    }

    /// Append a review and recompute the ratings.
    pub fn add_review(
        &mut self,
        review_id: ReviewId,
        input: NewReview,
        now: DateTime<Utc>,
    ) -> DomainResult<ReviewId> {
        let user = required("user", input.user)?;
        let rating = required("rating", input.rating)?;
        let rating = u8::try_from(rating)
            .ok()
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| DomainError::validation("rating must be between 1 and 5"))?;
        let comment = limit_text(
            "comment",
            input.comment.as_deref().unwrap_or(""),
            REVIEW_COMMENT_MAX,
        )?;

        self.reviews.push(Review {
            id: review_id,
            user,
            rating,
            comment,
            created_at: now,
            is_verified_purchase: input.is_verified_purchase,
        });
        self.ratings = recompute_ratings(&self.reviews);
        self.updated_at = now;
        Ok(review_id)
    }

    /// Remove a review and recompute the ratings.
    pub fn remove_review(&mut self, review_id: ReviewId, now: DateTime<Utc>) -> DomainResult<Review> {
        let index = self
            .reviews
            .iter()
            .position(|r| r.id == review_id)
            .ok_or_else(|| DomainError::not_found(format!("review {review_id}")))?;

        let removed = self.reviews.remove(index);
        self.ratings = recompute_ratings(&self.reviews);
        self.updated_at = now;
        Ok(removed)
    }

    /// Shift the root stock or one variant option's stock by `delta`.
    ///
    /// Only the targeted counter changes. Returns the new value of that counter.
    pub fn adjust_stock(&mut self, target: &StockTarget, delta: i64, now: DateTime<Utc>) -> DomainResult<i64> {
        let next = match target {
            StockTarget::Root => {
                self.stock = apply_delta(self.stock, delta, "product")?;
                self.stock
            }
            StockTarget::Variant { variant, option } => {
                let slot = find_option_mut(&mut self.variants, variant, option)?;
                slot.stock = apply_delta(slot.stock, delta, &format!("{variant}/{option}"))?;
                slot.stock
            }
        };
        self.updated_at = now;
        Ok(next)
    }

    pub fn set_active(&mut self, is_active: bool, now: DateTime<Utc>) {
        self.is_active = is_active;
        self.updated_at = now;
    }

    pub fn record_view(&mut self, now: DateTime<Utc>) {
        self.views = self.views.saturating_add(1);
        self.updated_at = now;
    }

    /// Run every field check, normalizing text fields in place.
    fn validated(mut self) -> DomainResult<Self> {
        self.name = require_text("name", &self.name, NAME_MAX)?;
        self.description = limit_text("description", &self.description, DESCRIPTION_MAX)?;
        non_negative("price", self.price)?;
        if let Some(discount) = self.discount_price {
            non_negative("discountPrice", discount)?;
            if discount >= self.price {
                return Err(DomainError::validation(
                    "discountPrice must be less than the regular price",
                ));
            }
        }
        if let Some(brand) = &self.brand {
            self.brand = Some(require_text("brand", brand, NAME_MAX)?);
        }
        self.sku = require_text("sku", &self.sku, NAME_MAX)?;
        if self.stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }

        for image in &mut self.images {
            image.url = require_text("images.url", &image.url, usize::MAX)?;
        }
        for spec in &mut self.specifications {
            spec.name = require_text("specifications.name", &spec.name, usize::MAX)?;
            spec.value = require_text("specifications.value", &spec.value, usize::MAX)?;
        }
        for variant in &mut self.variants {
            variant.name = require_text("variants.name", &variant.name, usize::MAX)?;
            for option in &mut variant.options {
                option.value = require_text("variants.options.value", &option.value, usize::MAX)?;
                if option.stock < 0 {
                    return Err(DomainError::validation("variants.options.stock cannot be negative"));
                }
                if let Some(price) = option.price {
                    non_negative("variants.options.price", price)?;
                }
            }
        }

        if let Some(d) = &self.dimensions {
            for (field, value) in [
                ("dimensions.weight", d.weight),
                ("dimensions.length", d.length),
                ("dimensions.width", d.width),
                ("dimensions.height", d.height),
            ] {
                if let Some(v) = value {
                    non_negative(field, v)?;
                }
            }
        }
        non_negative("shippingInfo.weight", self.shipping_info.weight)?;
        non_negative("shippingInfo.shippingCost", self.shipping_info.shipping_cost)?;

        Ok(self)
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn discount_price(&self) -> Option<f64> {
        self.discount_price
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn images(&self) -> &[ProductImage] {
        &self.images
    }

    pub fn primary_image(&self) -> Option<&ProductImage> {
        primary_image(&self.images)
    }

    pub fn specifications(&self) -> &[Specification] {
        &self.specifications
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_featured(&self) -> bool {
        self.is_featured
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn ratings(&self) -> Ratings {
        self.ratings
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn dimensions(&self) -> Option<&Dimensions> {
        self.dimensions.as_ref()
    }

    pub fn shipping_info(&self) -> &ShippingInfo {
        &self.shipping_info
    }

    pub fn seller(&self) -> Option<UserId> {
        self.seller
    }

    pub fn views(&self) -> u64 {
        self.views
    }

    pub fn sales_count(&self) -> u64 {
        self.sales_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Document for Product {
    type Id = ProductId;

    const COLLECTION: &'static str = "products";

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
        vec![UniqueKey::new("sku", self.sku.clone())]
    }
}
