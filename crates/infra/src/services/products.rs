use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use storefront_core::{CategoryId, Document, DomainResult, ExpectedVersion, ProductId, ReviewId};
use storefront_products::{NewProduct, NewReview, Product, ProductPatch, QuickProduct, StockTarget};

use super::{CategoryService, ServiceError, ServiceResult};
use crate::config::DEFAULT_STOCK_UPDATE_MAX_ATTEMPTS;
use crate::store::{DocumentStore, Query, SortDirection, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<CategoryId>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn DocumentStore<Product>>,
    categories: CategoryService,
    stock_attempts: u32,
}

impl ProductService {
    pub fn new(store: Arc<dyn DocumentStore<Product>>, categories: CategoryService) -> Self {
        Self {
            store,
            categories,
            stock_attempts: DEFAULT_STOCK_UPDATE_MAX_ATTEMPTS,
        }
    }

    pub fn with_stock_attempts(mut self, attempts: u32) -> Self {
        self.stock_attempts = attempts.max(1);
        self
    }

    #[instrument(skip(self, input, now), err)]
    pub async fn create(&self, input: NewProduct, now: DateTime<Utc>) -> ServiceResult<Product> {
        let product = Product::create(ProductId::new(), input, now)?;
        if let Some(category) = product.category() {
            self.categories.require_existing(category, "category").await?;
        }

        let stored = self.store.insert(product).await?;
        info!(product_id = %stored.id_typed(), sku = stored.sku(), "product created");

        if let Some(category) = stored.category() {
            self.bump_category(category, 1, now).await;
        }
        Ok(stored)
    }

    /// Reduced listing: image, name and price only.
    #[instrument(skip(self, input, now), err)]
    pub async fn create_quick(&self, input: QuickProduct, now: DateTime<Utc>) -> ServiceResult<Product> {
        let product = Product::create_quick(ProductId::new(), input, now)?;
        let stored = self.store.insert(product).await?;
        info!(product_id = %stored.id_typed(), sku = stored.sku(), "quick product created");
        Ok(stored)
    }

    #[instrument(skip(self, patch, now), err)]
    pub async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
        now: DateTime<Utc>,
    ) -> ServiceResult<Product> {
        let mut product = self.get(id).await?;
        let previous_category = product.category();

        if let Some(category) = patch.category {
            if Some(category) != previous_category {
                self.categories.require_existing(category, "category").await?;
            }
        }

        let expected = ExpectedVersion::Exact(product.version());
        product.apply_patch(patch, now)?;
        let stored = self.store.update(product, expected).await?;
        info!(product_id = %id, version = stored.version(), "product updated");

        if stored.category() != previous_category {
            if let Some(old) = previous_category {
                self.bump_category(old, -1, now).await;
            }
            if let Some(new) = stored.category() {
                self.bump_category(new, 1, now).await;
            }
        }
        Ok(stored)
    }

    pub async fn add_review(
        &self,
        id: ProductId,
        review: NewReview,
        now: DateTime<Utc>,
    ) -> ServiceResult<(Product, ReviewId)> {
        let mut review_id = None;
        let stored = self
            .modify(id, |product| {
                review_id = Some(product.add_review(ReviewId::new(), review, now)?);
                Ok(())
            })
            .await?;
        let review_id = review_id.ok_or_else(|| ServiceError::validation("review was not recorded"))?;

        let ratings = stored.ratings();
        info!(product_id = %id, review_id = %review_id, average = ratings.average, count = ratings.count, "review added");
        Ok((stored, review_id))
    }

    pub async fn remove_review(
        &self,
        id: ProductId,
        review_id: ReviewId,
        now: DateTime<Utc>,
    ) -> ServiceResult<Product> {
        let stored = self
            .modify(id, |product| product.remove_review(review_id, now).map(|_| ()))
            .await?;
        info!(product_id = %id, review_id = %review_id, "review removed");
        Ok(stored)
    }

    /// Shift a stock counter by `delta`.
    ///
    /// Deltas commute, so a write that lost an optimistic-concurrency race is
    /// re-read and re-applied, up to the configured attempt limit.
    #[instrument(skip(self, now), err)]
    pub async fn adjust_stock(
        &self,
        id: ProductId,
        target: StockTarget,
        delta: i64,
        now: DateTime<Utc>,
    ) -> ServiceResult<Product> {
        for attempt in 1..=self.stock_attempts {
            let mut product = self.get(id).await?;
            let expected = ExpectedVersion::Exact(product.version());
            let level = product.adjust_stock(&target, delta, now)?;

            match self.store.update(product, expected).await {
                Ok(stored) => {
                    info!(product_id = %id, delta, level, "stock adjusted");
                    return Ok(stored);
                }
                Err(StoreError::VersionConflict(msg)) => {
                    warn!(product_id = %id, attempt, %msg, "stock update raced, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Exhausted {
            operation: "stock adjustment",
            attempts: self.stock_attempts,
        })
    }

    pub async fn set_active(
        &self,
        id: ProductId,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> ServiceResult<Product> {
        let stored = self
            .modify(id, |product| {
                product.set_active(is_active, now);
                Ok(())
            })
            .await?;
        info!(product_id = %id, is_active, "product activation changed");
        Ok(stored)
    }

    pub async fn record_view(&self, id: ProductId, now: DateTime<Utc>) -> ServiceResult<Product> {
        self.modify(id, |product| {
            product.record_view(now);
            Ok(())
        })
        .await
    }

    pub async fn get(&self, id: ProductId) -> ServiceResult<Product> {
        debug!(product_id = %id, "loading product");
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("product {id}")))
    }

    /// Products matching `filter`, newest first.
    pub async fn list(&self, filter: ProductFilter) -> ServiceResult<Vec<Product>> {
        let query = Query::all()
            .filter_opt("category", filter.category.map(|c| c.to_string()))
            .filter_opt("isActive", filter.is_active)
            .filter_opt("isFeatured", filter.is_featured)
            .sort_by("createdAt", SortDirection::Descending)
            .sort_by("id", SortDirection::Descending);
        Ok(self.store.find(&query).await?)
    }

    /// Single read-modify-write. A concurrent writer surfaces as a conflict.
    async fn modify<F>(&self, id: ProductId, change: F) -> ServiceResult<Product>
    where
        F: FnOnce(&mut Product) -> DomainResult<()> + Send,
    {
        let mut product = self.get(id).await?;
        let expected = ExpectedVersion::Exact(product.version());
        change(&mut product)?;
        Ok(self.store.update(product, expected).await?)
    }

    /// The product write already succeeded; a failed counter update is logged
    /// and left for the next recount.
    async fn bump_category(&self, category: CategoryId, delta: i64, now: DateTime<Utc>) {
        if let Err(e) = self.categories.adjust_product_count(category, delta, now).await {
            warn!(category_id = %category, delta, error = %e, "failed to update category product count");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_categories::{Category, NewCategory};
    use storefront_products::{ProductImage, Variant, VariantOption};

    use crate::store::InMemoryDocumentStore;

    struct Fixture {
        categories: CategoryService,
        products: ProductService,
        category: CategoryId,
    }

    async fn fixture() -> Fixture {
        let categories =
            CategoryService::new(Arc::new(InMemoryDocumentStore::<Category>::new()));
        let products = ProductService::new(
            Arc::new(InMemoryDocumentStore::<Product>::new()),
            categories.clone(),
        );
        let category = categories
            .create(
                NewCategory {
                    name: Some("Audio".to_string()),
                    ..NewCategory::default()
                },
                Utc::now(),
            )
            .await
            .unwrap()
            .id_typed();
        Fixture {
            categories,
            products,
            category,
        }
    }

    fn new_product(sku: &str, category: CategoryId) -> NewProduct {
        NewProduct {
            name: Some("Headphones".to_string()),
            description: Some("Closed-back studio headphones".to_string()),
            price: Some(120.0),
            category: Some(category),
            brand: Some("Acme".to_string()),
            sku: Some(sku.to_string()),
            stock: Some(10),
            seller: Some(storefront_core::UserId::new()),
            images: vec![ProductImage::new("a.jpg"), ProductImage::new("b.jpg")],
            variants: vec![Variant {
                name: "Color".to_string(),
                options: vec![VariantOption {
                    value: "Black".to_string(),
                    stock: 2,
                    price: None,
                }],
            }],
            ..NewProduct::default()
        }
    }

    fn review(rating: i64) -> NewReview {
        NewReview {
            user: Some(storefront_core::UserId::new()),
            rating: Some(rating),
            comment: Some("Solid".to_string()),
            is_verified_purchase: true,
        }
    }

    #[tokio::test]
    async fn create_checks_category_and_sku_uniqueness() {
        let fx = fixture().await;
        let now = Utc::now();

        let created = fx.products.create(new_product("HP-1", fx.category), now).await.unwrap();
        assert_eq!(created.primary_image().map(|i| i.url.as_str()), Some("a.jpg"));
        assert_eq!(fx.categories.get(fx.category).await.unwrap().product_count(), 1);

        let err = fx
            .products
            .create(new_product("HP-1", fx.category), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

        let err = fx
            .products
            .create(new_product("HP-2", CategoryId::new()), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn discount_equal_to_price_is_rejected() {
        let fx = fixture().await;
        let mut input = new_product("HP-1", fx.category);
        input.discount_price = Some(120.0);

        let err = fx.products.create(input, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn moving_category_shifts_product_counts() {
        let fx = fixture().await;
        let now = Utc::now();
        let other = fx
            .categories
            .create(
                NewCategory {
                    name: Some("Video".to_string()),
                    ..NewCategory::default()
                },
                now,
            )
            .await
            .unwrap()
            .id_typed();
        let product = fx.products.create(new_product("HP-1", fx.category), now).await.unwrap();

        fx.products
            .update(
                product.id_typed(),
                ProductPatch {
                    category: Some(other),
                    ..ProductPatch::default()
                },
                now,
            )
            .await
            .unwrap();

        assert_eq!(fx.categories.get(fx.category).await.unwrap().product_count(), 0);
        assert_eq!(fx.categories.get(other).await.unwrap().product_count(), 1);
    }

    #[tokio::test]
    async fn reviews_recompute_ratings_and_bad_ratings_leave_them_unchanged() {
        let fx = fixture().await;
        let now = Utc::now();
        let id = fx
            .products
            .create(new_product("HP-1", fx.category), now)
            .await
            .unwrap()
            .id_typed();

        fx.products.add_review(id, review(5), now).await.unwrap();
        let (product, second) = fx.products.add_review(id, review(4), now).await.unwrap();
        assert_eq!(product.ratings().count, 2);
        assert_eq!(product.ratings().average, 4.5);

        let err = fx.products.add_review(id, review(6), now).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
        assert_eq!(fx.products.get(id).await.unwrap().ratings(), product.ratings());

        let product = fx.products.remove_review(id, second, now).await.unwrap();
        assert_eq!(product.ratings().count, 1);
        assert_eq!(product.ratings().average, 5.0);

        let err = fx.products.remove_review(id, second, now).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)), "{err:?}");
    }

    #[tokio::test]
    async fn stock_adjustments_target_root_or_variant() {
        let fx = fixture().await;
        let now = Utc::now();
        let id = fx
            .products
            .create(new_product("HP-1", fx.category), now)
            .await
            .unwrap()
            .id_typed();

        let product = fx.products.adjust_stock(id, StockTarget::Root, -4, now).await.unwrap();
        assert_eq!(product.stock(), 6);

        let target = StockTarget::Variant {
            variant: "Color".to_string(),
            option: "Black".to_string(),
        };
        let product = fx.products.adjust_stock(id, target.clone(), -2, now).await.unwrap();
        assert_eq!(product.variants()[0].options[0].stock, 0);
        assert_eq!(product.stock(), 6);

        let err = fx.products.adjust_stock(id, target, -1, now).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "{err:?}");

        let missing = StockTarget::Variant {
            variant: "Size".to_string(),
            option: "XL".to_string(),
        };
        let err = fx.products.adjust_stock(id, missing, 1, now).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)), "{err:?}");
    }

    #[tokio::test]
    async fn concurrent_stock_adjustments_all_apply() {
        let fx = fixture().await;
        let now = Utc::now();
        let products = fx.products.clone().with_stock_attempts(50);
        let id = products
            .create(new_product("HP-1", fx.category), now)
            .await
            .unwrap()
            .id_typed();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = products.clone();
            handles.push(tokio::spawn(async move {
                svc.adjust_stock(id, StockTarget::Root, 1, now).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(fx.products.get(id).await.unwrap().stock(), 18);
    }

    #[tokio::test]
    async fn activation_views_and_listing() {
        let fx = fixture().await;
        let now = Utc::now();
        let first = fx.products.create(new_product("HP-1", fx.category), now).await.unwrap();
        let later = now + chrono::Duration::seconds(1);
        let mut featured = new_product("HP-2", fx.category);
        featured.is_featured = Some(true);
        let second = fx.products.create(featured, later).await.unwrap();

        fx.products.set_active(first.id_typed(), false, now).await.unwrap();
        let viewed = fx.products.record_view(second.id_typed(), now).await.unwrap();
        assert_eq!(viewed.views(), 1);

        let all = fx.products.list(ProductFilter::default()).await.unwrap();
        let ids: Vec<ProductId> = all.iter().map(|p| p.id_typed()).collect();
        assert_eq!(ids, vec![second.id_typed(), first.id_typed()]);

        let active = fx
            .products
            .list(ProductFilter {
                is_active: Some(true),
                ..ProductFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);

        let in_category = fx
            .products
            .list(ProductFilter {
                category: Some(fx.category),
                is_featured: Some(true),
                ..ProductFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(in_category.len(), 1);
        assert_eq!(in_category[0].id_typed(), second.id_typed());
    }

    #[tokio::test]
    async fn quick_products_get_generated_sku() {
        let fx = fixture().await;
        let product = fx
            .products
            .create_quick(
                QuickProduct {
                    img: Some("x.png".to_string()),
                    name: Some("Mug".to_string()),
                    price: Some(9.5),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(product.sku(), format!("SKU-{}", product.id_typed()));
        assert!(product.category().is_none());

        let err = fx
            .products
            .create_quick(QuickProduct::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
