use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use storefront_core::OrderId;
use storefront_infra::services::{OrderFilter, ServiceResult};
use storefront_orders::{DeliveryInfo, NewOrder, Order, OrderNotes, OrderNumber, Tracking};

use crate::app::dto;
use crate::app::errors::{self, ApiJson};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/by-number/:number", get(get_order_by_number))
        .route("/:id", get(get_order))
        .route("/:id/status", post(change_status))
        .route("/:id/cancellation", post(request_cancellation))
        .route("/:id/cancellation/approve", post(approve_cancellation))
        .route("/:id/cancellation/refund", post(update_refund_status))
        .route("/:id/return", post(request_return))
        .route("/:id/return/decision", post(decide_return))
        .route("/:id/tracking", post(update_tracking))
        .route("/:id/payment", post(update_payment_status))
        .route("/:id/notes", post(set_notes))
        .route("/:id/delivery", post(set_delivery_info))
}

fn parse_order_id(raw: &str) -> Result<OrderId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("order", raw))
}

fn respond(result: ServiceResult<Order>) -> axum::response::Response {
    match result {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewOrder>,
) -> axum::response::Response {
    match services.orders.place(body, Utc::now()).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::OrderListParams>,
) -> axum::response::Response {
    let user = match params.user.as_deref().map(dto::parse_user_id).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match params.status.as_deref().map(dto::parse_status).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let filter = OrderFilter {
        user,
        email: params.email,
        status,
    };
    match services.orders.list(filter).await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(services.orders.get(id).await)
}

pub async fn get_order_by_number(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
) -> axum::response::Response {
    let number = match OrderNumber::parse(&number) {
        Ok(n) => n,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
    };
    respond(services.orders.get_by_number(&number).await)
}

pub async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ChangeStatusRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let status = match dto::parse_status(&body.status) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    respond(services.orders.change_status(id, status, body.note, Utc::now()).await)
}

pub async fn request_cancellation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ReasonRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(services.orders.request_cancellation(id, &body.reason, Utc::now()).await)
}

pub async fn approve_cancellation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ApproveCancellationRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(
        services
            .orders
            .approve_cancellation(id, body.refund_amount, Utc::now())
            .await,
    )
}

pub async fn update_refund_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::RefundStatusRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(services.orders.update_refund_status(id, body.status, Utc::now()).await)
}

pub async fn request_return(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ReasonRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(services.orders.request_return(id, &body.reason, Utc::now()).await)
}

pub async fn decide_return(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ReturnDecisionRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(services.orders.decide_return(id, body.decision, Utc::now()).await)
}

pub async fn update_tracking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Tracking>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(services.orders.update_tracking(id, body, Utc::now()).await)
}

pub async fn update_payment_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::PaymentStatusRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(
        services
            .orders
            .update_payment_status(id, body.status, body.transaction_id, Utc::now())
            .await,
    )
}

pub async fn set_notes(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<OrderNotes>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(services.orders.set_notes(id, body, Utc::now()).await)
}

pub async fn set_delivery_info(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<DeliveryInfo>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(services.orders.set_delivery_info(id, body, Utc::now()).await)
}
