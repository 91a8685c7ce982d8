//! Reduced-field `/orders` and `/products` endpoints.
//!
//! These read and write the same documents as the catalog/sales routes and
//! only differ in the JSON shape. Success is always 200.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use storefront_infra::services::{OrderFilter, ProductFilter};
use storefront_orders::QuickOrder;
use storefront_products::QuickProduct;

use crate::app::dto::{LegacyOrderView, LegacyProductView};
use crate::app::errors::{self, ApiJson};
use crate::app::services::AppServices;

pub fn orders_router() -> Router {
    // The static `/all` segment takes priority over `/:email`.
    Router::new()
        .route("/new", post(create_order))
        .route("/all", get(list_all_orders))
        .route("/:email", get(list_orders_by_email))
}

pub fn products_router() -> Router {
    Router::new()
        .route("/all", get(list_all_products))
        .route("/new", post(create_product))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<QuickOrder>,
) -> axum::response::Response {
    match services.orders.place_quick(body, Utc::now()).await {
        Ok(order) => Json(LegacyOrderView::from(&order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_orders_by_email(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    let filter = OrderFilter {
        email: Some(email.trim().to_string()),
        ..OrderFilter::default()
    };
    match services.orders.list(filter).await {
        Ok(orders) => Json(orders.iter().map(LegacyOrderView::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_all_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders.list(OrderFilter::default()).await {
        Ok(orders) => Json(orders.iter().map(LegacyOrderView::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_all_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.products.list(ProductFilter::default()).await {
        Ok(products) => {
            Json(products.iter().map(LegacyProductView::from).collect::<Vec<_>>()).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<QuickProduct>,
) -> axum::response::Response {
    match services.products.create_quick(body, Utc::now()).await {
        Ok(product) => Json(LegacyProductView::from(&product)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
