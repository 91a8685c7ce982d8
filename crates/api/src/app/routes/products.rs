use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::Utc;

use storefront_core::{ProductId, ReviewId};
use storefront_infra::services::ProductFilter;
use storefront_products::{NewProduct, NewReview, ProductPatch};

use crate::app::dto;
use crate::app::errors::{self, ApiJson};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product).patch(update_product))
        .route("/:id/reviews", post(add_review))
        .route("/:id/reviews/:review_id", delete(remove_review))
        .route("/:id/stock", post(adjust_stock))
        .route("/:id/activate", post(activate_product))
        .route("/:id/deactivate", post(deactivate_product))
        .route("/:id/views", post(record_view))
}

fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("product", raw))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewProduct>,
) -> axum::response::Response {
    match services.products.create(body, Utc::now()).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ProductListParams>,
) -> axum::response::Response {
    let category = match params.category.as_deref().map(dto::parse_category_id).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let is_active = match dto::parse_bool("active", params.active.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let is_featured = match dto::parse_bool("featured", params.featured.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let filter = ProductFilter {
        category,
        is_active,
        is_featured,
    };
    match services.products.list(filter).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.get(id).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.update(id, patch, Utc::now()).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_review(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NewReview>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.add_review(id, body, Utc::now()).await {
        Ok((product, review_id)) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "reviewId": review_id,
                "product": product,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_review(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, review_id)): Path<(String, String)>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let review_id: ReviewId = match review_id.parse() {
        Ok(r) => r,
        Err(_) => return errors::invalid_id("review", &review_id),
    };
    match services.products.remove_review(id, review_id, Utc::now()).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let target = match body.target() {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match services.products.adjust_stock(id, target, body.delta, Utc::now()).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

async fn set_active(services: &AppServices, id: &str, is_active: bool) -> axum::response::Response {
    let id = match parse_product_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.set_active(id, is_active, Utc::now()).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn activate_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(&services, &id, true).await
}

pub async fn deactivate_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(&services, &id, false).await
}

pub async fn record_view(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.products.record_view(id, Utc::now()).await {
        Ok(product) => Json(serde_json::json!({ "views": product.views() })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
