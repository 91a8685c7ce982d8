use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use storefront_categories::{Category, CategoryPatch, NewCategory};
use storefront_infra::services::CategoryFilter;

use crate::app::dto::{self, CategoryView};
use crate::app::errors::{self, ApiJson};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", get(get_category).patch(update_category))
        .route("/:id/subcategories", get(list_subcategories))
}

async fn view(services: &AppServices, category: Category) -> axum::response::Response {
    match services.categories.subcategories(category.id_typed()).await {
        Ok(children) => Json(CategoryView {
            subcategories: children.iter().map(|c| c.id_typed()).collect(),
            category,
        })
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewCategory>,
) -> axum::response::Response {
    let category = match services.categories.create(body, Utc::now()).await {
        Ok(c) => c,
        Err(e) => return errors::service_error_to_response(e),
    };
    (
        StatusCode::CREATED,
        Json(CategoryView {
            category,
            subcategories: Vec::new(),
        }),
    )
        .into_response()
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::CategoryListParams>,
) -> axum::response::Response {
    let is_active = match dto::parse_bool("active", params.active.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let parent = match params.parent.as_deref().map(dto::parse_category_id).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let categories = match services.categories.list(CategoryFilter { is_active, parent }).await {
        Ok(c) => c,
        Err(e) => return errors::service_error_to_response(e),
    };
    let mut children = match services.categories.children_index().await {
        Ok(index) => index,
        Err(e) => return errors::service_error_to_response(e),
    };

    let views: Vec<CategoryView> = categories
        .into_iter()
        .map(|category| CategoryView {
            subcategories: children.remove(&category.id_typed()).unwrap_or_default(),
            category,
        })
        .collect();
    Json(views).into_response()
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_category_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.categories.get(id).await {
        Ok(category) => view(&services, category).await,
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<CategoryPatch>,
) -> axum::response::Response {
    let id = match dto::parse_category_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.categories.update(id, patch, Utc::now()).await {
        Ok(category) => view(&services, category).await,
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_subcategories(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_category_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.categories.subcategories(id).await {
        Ok(children) => Json(children).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
