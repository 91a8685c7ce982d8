use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::field::{limit_text, non_negative, require_text, required};
use storefront_core::{Document, DomainError, DomainResult, OrderId, ProductId, UniqueKey, UserId};

use crate::number::OrderNumber;
use crate::status::{OrderStatus, StatusEntry};

/// Accepted difference between `total` and the sum of its components.
pub const PRICING_TOLERANCE: f64 = 0.01;
pub const REASON_MAX: usize = 500;
pub const NOTE_MAX: usize = 1000;

const CREATED_NOTE: &str = "Order created";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedVariant {
    pub name: String,
    pub value: String,
}

/// Product details captured when the order was placed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

impl ProductSnapshot {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.image.is_none() && self.sku.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub product: Option<ProductId>,
    pub quantity: u32,
    pub price: f64,
    #[serde(default)]
    pub selected_variants: Vec<SelectedVariant>,
    #[serde(default)]
    pub product_snapshot: ProductSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "paypal")]
    Paypal,
    #[serde(rename = "cash-on-delivery", alias = "cod")]
    CashOnDelivery,
    #[serde(rename = "bank_transfer")]
    BankTransfer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
}

/// Order amounts. `total` is supplied by the caller and checked against the
/// components, never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub subtotal: f64,
    #[serde(default)]
    pub shipping: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub discount: f64,
    pub total: f64,
}

impl Pricing {
    fn validate(&self) -> DomainResult<()> {
        non_negative("pricing.subtotal", self.subtotal)?;
        non_negative("pricing.shipping", self.shipping)?;
        non_negative("pricing.tax", self.tax)?;
        non_negative("pricing.discount", self.discount)?;
        non_negative("pricing.total", self.total)?;

        let expected = self.subtotal + self.shipping + self.tax - self.discount;
        if (expected - self.total).abs() > PRICING_TOLERANCE {
            return Err(DomainError::validation(format!(
                "pricing.total {} does not match subtotal + shipping + tax - discount ({expected:.2})",
                self.total
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivery_instructions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNotes {
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub admin: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Processed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub reason: String,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub refund_amount: Option<f64>,
    #[serde(default)]
    pub refund_status: Option<RefundStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnStatus {
    Requested,
    Approved,
    Denied,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub reason: String,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    pub status: ReturnStatus,
}

/// Order document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    #[serde(default)]
    user: Option<UserId>,
    #[serde(default)]
    email: Option<String>,
    order_number: OrderNumber,
    items: Vec<OrderItem>,
    #[serde(default)]
    shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    payment_info: Option<PaymentInfo>,
    pricing: Pricing,
    #[serde(default)]
    discount_code: Option<DiscountCode>,
    status: OrderStatus,
    status_history: Vec<StatusEntry>,
    #[serde(default)]
    tracking: Tracking,
    #[serde(default)]
    delivery_info: DeliveryInfo,
    #[serde(default)]
    notes: OrderNotes,
    #[serde(default)]
    cancellation: Option<Cancellation>,
    #[serde(default, rename = "return")]
    return_request: Option<ReturnRequest>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

/// Line of a checkout request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product: Option<ProductId>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    #[serde(default)]
    pub selected_variants: Vec<SelectedVariant>,
    #[serde(default)]
    pub product_snapshot: Option<ProductSnapshot>,
}

/// Checkout request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user: Option<UserId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_info: Option<PaymentInfo>,
    pub pricing: Option<Pricing>,
    #[serde(default)]
    pub discount_code: Option<DiscountCode>,
    #[serde(default)]
    pub notes: Option<OrderNotes>,
    #[serde(default)]
    pub delivery_info: Option<DeliveryInfo>,
}

/// Line of the reduced order form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickOrderLine {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
}

/// Reduced order form: contact email, named lines and a single amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickOrder {
    pub email: Option<String>,
    #[serde(default)]
    pub products: Vec<QuickOrderLine>,
    pub order_value: Option<f64>,
}

fn quantity(value: Option<i64>) -> DomainResult<u32> {
    let raw = required("quantity", value)?;
    u32::try_from(raw)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| DomainError::validation("quantity must be at least 1"))
}

fn non_blank(field: &str, value: &str) -> DomainResult<String> {
    require_text(field, value, usize::MAX)
}

fn validate_address(address: ShippingAddress) -> DomainResult<ShippingAddress> {
    Ok(ShippingAddress {
        name: non_blank("shippingAddress.name", &address.name)?,
        street: non_blank("shippingAddress.street", &address.street)?,
        city: non_blank("shippingAddress.city", &address.city)?,
        state: non_blank("shippingAddress.state", &address.state)?,
        zip_code: non_blank("shippingAddress.zipCode", &address.zip_code)?,
        country: non_blank("shippingAddress.country", &address.country)?,
        phone: address.phone.filter(|p| !p.trim().is_empty()),
    })
}

fn validate_email(email: &str) -> DomainResult<String> {
    non_blank("email", email)
}

impl Order {
    /// Validate a checkout request and build the order in `pending` with its
    /// first history entry.
    pub fn place(
        id: OrderId,
        order_number: OrderNumber,
        input: NewOrder,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let user = required("user", input.user)?;
        if input.items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }
        let items = input
            .items
            .into_iter()
            .map(|item| -> DomainResult<OrderItem> {
                Ok(OrderItem {
                    product: Some(required("items.product", item.product)?),
                    quantity: quantity(item.quantity)?,
                    price: non_negative("items.price", required("items.price", item.price)?)?,
                    selected_variants: item.selected_variants,
                    product_snapshot: item.product_snapshot.unwrap_or_default(),
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let shipping_address = validate_address(required("shippingAddress", input.shipping_address)?)?;
        let mut payment_info = required("paymentInfo", input.payment_info)?;
        if payment_info.status == PaymentStatus::Completed && payment_info.payment_date.is_none() {
            payment_info.payment_date = Some(now);
        }
        let pricing = required("pricing", input.pricing)?;
        pricing.validate()?;

        if let Some(code) = &input.discount_code {
            non_blank("discountCode.code", &code.code)?;
            non_negative("discountCode.amount", code.amount)?;
        }
        let email = input.email.as_deref().map(validate_email).transpose()?;
        let notes = input.notes.unwrap_or_default();
        validate_notes(&notes)?;

        Ok(Self::new_pending(
            id,
            order_number,
            Some(user),
            email,
            items,
            Some(shipping_address),
            Some(payment_info),
            pricing,
            input.discount_code,
            notes,
            input.delivery_info.unwrap_or_default(),
            now,
        ))
    }

    /// Build an order from the reduced form. Items only carry a name,
    /// and the order value stands for both subtotal and total.
    pub fn place_quick(
        id: OrderId,
        order_number: OrderNumber,
        input: QuickOrder,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let email = validate_email(&required("email", input.email)?)?;
        if input.products.is_empty() {
            return Err(DomainError::validation("order must contain at least one product"));
        }
        let items = input
            .products
            .into_iter()
            .map(|line| -> DomainResult<OrderItem> {
                let name = required("products.name", line.name)?;
                Ok(OrderItem {
                    product: None,
                    quantity: quantity(line.quantity)?,
                    price: non_negative("products.price", required("products.price", line.price)?)?,
                    selected_variants: Vec::new(),
                    product_snapshot: ProductSnapshot {
                        name: Some(non_blank("products.name", &name)?),
                        image: None,
                        sku: None,
                    },
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;
        let value = non_negative("orderValue", required("orderValue", input.order_value)?)?;

        Ok(Self::new_pending(
            id,
            order_number,
            None,
            Some(email),
            items,
            None,
            None,
            Pricing {
                subtotal: value,
                shipping: 0.0,
                tax: 0.0,
                discount: 0.0,
                total: value,
            },
            None,
            OrderNotes::default(),
            DeliveryInfo::default(),
            now,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn new_pending(
        id: OrderId,
        order_number: OrderNumber,
        user: Option<UserId>,
        email: Option<String>,
        items: Vec<OrderItem>,
        shipping_address: Option<ShippingAddress>,
        payment_info: Option<PaymentInfo>,
        pricing: Pricing,
        discount_code: Option<DiscountCode>,
        notes: OrderNotes,
        delivery_info: DeliveryInfo,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user,
            email,
            order_number,
            items,
            shipping_address,
            payment_info,
            pricing,
            discount_code,
            status: OrderStatus::Pending,
            status_history: vec![StatusEntry {
                status: OrderStatus::Pending,
                timestamp: now,
                note: Some(CREATED_NOTE.to_string()),
            }],
            tracking: Tracking::default(),
            delivery_info,
            notes,
            cancellation: None,
            return_request: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Move to `to` and append a history entry.
    pub fn change_status(
        &mut self,
        to: OrderStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.status.check_transition(to)?;
        let note = note
            .map(|n| limit_text("note", &n, NOTE_MAX))
            .transpose()?
            .filter(|n| !n.is_empty());
        self.record_status(to, note, now);
        Ok(())
    }

    fn record_status(&mut self, to: OrderStatus, note: Option<String>, now: DateTime<Utc>) {
        self.status = to;
        self.status_history.push(StatusEntry {
            status: to,
            timestamp: now,
            note,
        });
        self.updated_at = now;
    }

    fn cancellable(&self) -> DomainResult<()> {
        match self.status {
            OrderStatus::Delivered | OrderStatus::Returned => Err(DomainError::conflict(format!(
                "a {} order can no longer be cancelled",
                self.status
            ))),
            _ => Ok(()),
        }
    }

    pub fn request_cancellation(&mut self, reason: &str, now: DateTime<Utc>) -> DomainResult<()> {
        self.cancellable()?;
        if self.status == OrderStatus::Cancelled {
            return Err(DomainError::conflict("order is already cancelled"));
        }
        if self.cancellation.as_ref().is_some_and(|c| c.approved_at.is_none()) {
            return Err(DomainError::conflict("a cancellation is already pending"));
        }
        let reason = require_text("reason", reason, REASON_MAX)?;

        self.cancellation = Some(Cancellation {
            reason,
            requested_at: now,
            approved_at: None,
            refund_amount: None,
            refund_status: None,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Approve the pending cancellation and cancel the order.
    ///
    /// When the status is already `cancelled` the approval is recorded without
    /// a second history entry.
    pub fn approve_cancellation(&mut self, refund_amount: f64, now: DateTime<Utc>) -> DomainResult<()> {
        let Some(cancellation) = &self.cancellation else {
            return Err(DomainError::conflict("no cancellation was requested"));
        };
        if cancellation.approved_at.is_some() {
            return Err(DomainError::conflict("cancellation was already approved"));
        }
        self.cancellable()?;
        non_negative("refundAmount", refund_amount)?;
        if refund_amount > self.pricing.total {
            return Err(DomainError::validation(format!(
                "refundAmount cannot exceed the order total ({})",
                self.pricing.total
            )));
        }

        if let Some(cancellation) = self.cancellation.as_mut() {
            cancellation.approved_at = Some(now);
            cancellation.refund_amount = Some(refund_amount);
            cancellation.refund_status = Some(RefundStatus::Pending);
        }
        if self.status != OrderStatus::Cancelled {
            self.record_status(
                OrderStatus::Cancelled,
                Some("Cancellation approved".to_string()),
                now,
            );
        }
        self.updated_at = now;
        Ok(())
    }

    /// Settle the refund of an approved cancellation.
    pub fn update_refund_status(&mut self, status: RefundStatus, now: DateTime<Utc>) -> DomainResult<()> {
        let cancellation = self
            .cancellation
            .as_mut()
            .filter(|c| c.approved_at.is_some())
            .ok_or_else(|| DomainError::conflict("no approved cancellation to refund"))?;

        if status == RefundStatus::Pending {
            return Err(DomainError::validation(
                "refund status can only move to processed or failed",
            ));
        }
        if cancellation.refund_status == Some(RefundStatus::Processed) {
            return Err(DomainError::conflict("refund was already processed"));
        }

        cancellation.refund_status = Some(status);
        if status == RefundStatus::Processed {
            if let Some(payment) = self.payment_info.as_mut() {
                payment.status = PaymentStatus::Refunded;
            }
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn request_return(&mut self, reason: &str, now: DateTime<Utc>) -> DomainResult<()> {
        if self.return_request.is_some() {
            return Err(DomainError::conflict("a return is already on record"));
        }
        if self.status != OrderStatus::Delivered {
            return Err(DomainError::conflict(format!(
                "only delivered orders can be returned (status: {})",
                self.status
            )));
        }
        let reason = require_text("reason", reason, REASON_MAX)?;

        self.return_request = Some(ReturnRequest {
            reason,
            requested_at: now,
            approved_at: None,
            status: ReturnStatus::Requested,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Record a return decision.
    ///
    /// requested -> approved | denied, approved -> completed. Completion moves
    /// the order to `returned`.
    pub fn decide_return(&mut self, decision: ReturnStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if decision == ReturnStatus::Requested {
            return Err(DomainError::validation(
                "return decision must be approved, denied or completed",
            ));
        }
        let current = self
            .return_request
            .as_ref()
            .map(|r| r.status)
            .ok_or_else(|| DomainError::conflict("no return was requested"))?;

        let allowed = matches!(
            (current, decision),
            (ReturnStatus::Requested, ReturnStatus::Approved)
                | (ReturnStatus::Requested, ReturnStatus::Denied)
                | (ReturnStatus::Approved, ReturnStatus::Completed)
        );
        if !allowed {
            return Err(DomainError::conflict(format!(
                "return cannot move from {current:?} to {decision:?}"
            )));
        }

        if let Some(request) = self.return_request.as_mut() {
            request.status = decision;
            if decision == ReturnStatus::Approved {
                request.approved_at = Some(now);
            }
        }
        if decision == ReturnStatus::Completed && self.status != OrderStatus::Returned {
            self.record_status(OrderStatus::Returned, Some("Return completed".to_string()), now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Merge tracking fields; absent fields keep their value.
    pub fn update_tracking(&mut self, tracking: Tracking, now: DateTime<Utc>) {
        if tracking.carrier.is_some() {
            self.tracking.carrier = tracking.carrier;
        }
        if tracking.tracking_number.is_some() {
            self.tracking.tracking_number = tracking.tracking_number;
        }
        if tracking.tracking_url.is_some() {
            self.tracking.tracking_url = tracking.tracking_url;
        }
        self.updated_at = now;
    }

    /// Record a payment outcome. Completion stamps the payment date.
    pub fn update_payment_status(
        &mut self,
        status: PaymentStatus,
        transaction_id: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let payment = self
            .payment_info
            .as_mut()
            .ok_or_else(|| DomainError::conflict("order has no payment information"))?;

        payment.status = status;
        if transaction_id.is_some() {
            payment.transaction_id = transaction_id;
        }
        if status == PaymentStatus::Completed {
            payment.payment_date = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Merge customer/admin notes; absent fields keep their value.
    pub fn set_notes(&mut self, notes: OrderNotes, now: DateTime<Utc>) -> DomainResult<()> {
        validate_notes(&notes)?;
        if notes.customer.is_some() {
            self.notes.customer = notes.customer;
        }
        if notes.admin.is_some() {
            self.notes.admin = notes.admin;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Merge delivery fields; absent fields keep their value.
    pub fn set_delivery_info(&mut self, info: DeliveryInfo, now: DateTime<Utc>) {
        if info.estimated_delivery.is_some() {
            self.delivery_info.estimated_delivery = info.estimated_delivery;
        }
        if info.actual_delivery.is_some() {
            self.delivery_info.actual_delivery = info.actual_delivery;
        }
        if info.delivery_instructions.is_some() {
            self.delivery_info.delivery_instructions = info.delivery_instructions;
        }
        self.updated_at = now;
    }

    /// Fill the product snapshot of item `index` if it was not supplied.
    pub fn fill_snapshot(&mut self, index: usize, snapshot: ProductSnapshot) {
        if let Some(item) = self.items.get_mut(index) {
            if item.product_snapshot.is_empty() {
                item.product_snapshot = snapshot;
            }
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    pub fn payment_info(&self) -> Option<&PaymentInfo> {
        self.payment_info.as_ref()
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    pub fn discount_code(&self) -> Option<&DiscountCode> {
        self.discount_code.as_ref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn status_history(&self) -> &[StatusEntry] {
        &self.status_history
    }

    pub fn tracking(&self) -> &Tracking {
        &self.tracking
    }

    pub fn delivery_info(&self) -> &DeliveryInfo {
        &self.delivery_info
    }

    pub fn notes(&self) -> &OrderNotes {
        &self.notes
    }

    pub fn cancellation(&self) -> Option<&Cancellation> {
        self.cancellation.as_ref()
    }

    pub fn return_request(&self) -> Option<&ReturnRequest> {
        self.return_request.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn validate_notes(notes: &OrderNotes) -> DomainResult<()> {
    if let Some(customer) = &notes.customer {
        limit_text("notes.customer", customer, NOTE_MAX)?;
    }
    if let Some(admin) = &notes.admin {
        limit_text("notes.admin", admin, NOTE_MAX)?;
    }
    Ok(())
}

impl Document for Order {
    type Id = OrderId;

    const COLLECTION: &'static str = "orders";

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
        vec![UniqueKey::new("orderNumber", self.order_number.as_str())]
    }
}
