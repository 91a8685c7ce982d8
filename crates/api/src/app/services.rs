//! Store + service wiring for the HTTP layer.

use std::sync::Arc;

use sqlx::PgPool;

use storefront_categories::Category;
use storefront_infra::config::Settings;
use storefront_infra::services::{CategoryService, OrderService, ProductService};
use storefront_infra::store::{
    DocumentStore, InMemoryDocumentStore, PostgresDocumentStore, StoreError, ensure_schema,
};
use storefront_orders::Order;
use storefront_products::Product;

#[derive(Clone)]
pub struct AppServices {
    pub categories: CategoryService,
    pub products: ProductService,
    pub orders: OrderService,
}

impl AppServices {
    /// Services over process-local stores (tests, local dev).
    pub fn in_memory(settings: &Settings) -> Self {
        Self::wire(
            Arc::new(InMemoryDocumentStore::<Category>::new()),
            Arc::new(InMemoryDocumentStore::<Product>::new()),
            Arc::new(InMemoryDocumentStore::<Order>::new()),
            settings,
        )
    }

    /// Services over Postgres. Creates the document tables when missing.
    pub async fn postgres(pool: PgPool, settings: &Settings) -> Result<Self, StoreError> {
        ensure_schema(&pool).await?;
        Ok(Self::wire(
            Arc::new(PostgresDocumentStore::<Category>::new(pool.clone())),
            Arc::new(PostgresDocumentStore::<Product>::new(pool.clone())),
            Arc::new(PostgresDocumentStore::<Order>::new(pool)),
            settings,
        ))
    }

    fn wire(
        categories: Arc<dyn DocumentStore<Category>>,
        products: Arc<dyn DocumentStore<Product>>,
        orders: Arc<dyn DocumentStore<Order>>,
        settings: &Settings,
    ) -> Self {
        let category_service = CategoryService::new(categories);
        let product_service = ProductService::new(products.clone(), category_service.clone())
            .with_stock_attempts(settings.stock_update_max_attempts);
        let order_service =
            OrderService::new(orders, products).with_max_attempts(settings.order_number_max_attempts);

        Self {
            categories: category_service,
            products: product_service,
            orders: order_service,
        }
    }
}
