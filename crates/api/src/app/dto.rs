use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_categories::Category;
use storefront_core::{CategoryId, OrderId, UserId};
use storefront_orders::{Order, OrderStatus, PaymentStatus, RefundStatus, ReturnStatus};
use storefront_products::{Product, StockTarget};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CategoryListParams {
    pub active: Option<String>,
    pub parent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub category: Option<String>,
    pub active: Option<String>,
    pub featured: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub user: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
}

/// Stock change. Naming both `variant` and `option` targets that option;
/// naming neither targets the product-level counter.
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub option: Option<String>,
}

impl AdjustStockRequest {
    pub fn target(&self) -> Result<StockTarget, axum::response::Response> {
        match (&self.variant, &self.option) {
            (None, None) => Ok(StockTarget::Root),
            (Some(variant), Some(option)) => Ok(StockTarget::Variant {
                variant: variant.clone(),
                option: option.clone(),
            }),
            _ => Err(errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "variant and option must be given together",
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveCancellationRequest {
    pub refund_amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct RefundStatusRequest {
    pub status: RefundStatus,
}

#[derive(Debug, Deserialize)]
pub struct ReturnDecisionRequest {
    pub decision: ReturnStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusRequest {
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Category plus the ids of its direct children.
#[derive(Debug, Serialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<CategoryId>,
}

/// Reduced order shape served by the `/orders` routes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOrderView {
    pub id: OrderId,
    pub order_number: String,
    pub email: Option<String>,
    pub products: Vec<LegacyOrderLine>,
    pub order_value: f64,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct LegacyOrderLine {
    pub name: Option<String>,
    pub quantity: u32,
    pub price: f64,
}

impl From<&Order> for LegacyOrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id_typed(),
            order_number: order.order_number().to_string(),
            email: order.email().map(str::to_string),
            products: order
                .items()
                .iter()
                .map(|item| LegacyOrderLine {
                    name: item.product_snapshot.name.clone(),
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            order_value: order.pricing().total,
            order_date: order.created_at(),
            status: order.status(),
        }
    }
}

/// Reduced product shape served by the `/products` routes.
#[derive(Debug, Serialize)]
pub struct LegacyProductView {
    pub id: storefront_core::ProductId,
    pub img: Option<String>,
    pub name: String,
    pub price: f64,
}

impl From<&Product> for LegacyProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id_typed(),
            img: product.primary_image().map(|i| i.url.clone()),
            name: product.name().to_string(),
            price: product.price(),
        }
    }
}

// -------------------------
// Parameter parsing
// -------------------------

pub fn parse_bool(name: &str, raw: Option<&str>) -> Result<Option<bool>, axum::response::Response> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("{name} must be true or false, got '{other}'"),
        )),
    }
}

pub fn parse_category_id(raw: &str) -> Result<CategoryId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("category", raw))
}

pub fn parse_user_id(raw: &str) -> Result<UserId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("user", raw))
}

pub fn parse_status(raw: &str) -> Result<OrderStatus, axum::response::Response> {
    raw.parse().map_err(|e: storefront_core::DomainError| {
        errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
    })
}
