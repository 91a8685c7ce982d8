use axum::{Router, routing::get};

pub mod categories;
pub mod legacy;
pub mod orders;
pub mod products;
pub mod system;

/// Router for every resource endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/catalog/categories", categories::router())
        .nest("/catalog/products", products::router())
        .nest("/sales/orders", orders::router())
        .nest("/orders", legacy::orders_router())
        .nest("/products", legacy::products_router())
}
