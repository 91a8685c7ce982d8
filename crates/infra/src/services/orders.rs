use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use storefront_core::{Document, DomainResult, ExpectedVersion, OrderId, ProductId, UserId};
use storefront_orders::{
    DeliveryInfo, NewOrder, Order, OrderNotes, OrderNumber, OrderNumberGenerator, OrderStatus,
    PaymentStatus, ProductSnapshot, QuickOrder, RefundStatus, ReturnStatus, Tracking,
};
use storefront_products::Product;

use super::{ServiceError, ServiceResult};
use crate::config::DEFAULT_ORDER_NUMBER_MAX_ATTEMPTS;
use crate::numbering::RandomSuffix;
use crate::store::{DocumentStore, Query, SortDirection, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub user: Option<UserId>,
    pub email: Option<String>,
    pub status: Option<OrderStatus>,
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn DocumentStore<Order>>,
    products: Arc<dyn DocumentStore<Product>>,
    numbers: Arc<dyn OrderNumberGenerator>,
    max_attempts: u32,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn DocumentStore<Order>>,
        products: Arc<dyn DocumentStore<Product>>,
    ) -> Self {
        Self {
            store,
            products,
            numbers: Arc::new(RandomSuffix),
            max_attempts: DEFAULT_ORDER_NUMBER_MAX_ATTEMPTS,
        }
    }

    pub fn with_number_generator(mut self, numbers: Arc<dyn OrderNumberGenerator>) -> Self {
        self.numbers = numbers;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Validate a checkout and store it as a pending order.
    #[instrument(skip(self, input, now), err)]
    pub async fn place(&self, input: NewOrder, now: DateTime<Utc>) -> ServiceResult<Order> {
        let snapshots = self.snapshots(&input).await;
        let id = OrderId::new();

        self.insert_numbered(now, |number| {
            let mut order = Order::place(id, number, input.clone(), now)?;
            for (index, snapshot) in &snapshots {
                order.fill_snapshot(*index, snapshot.clone());
            }
            Ok(order)
        })
        .await
    }

    /// Store an order from the reduced form (email, named lines, amount).
    #[instrument(skip(self, input, now), err)]
    pub async fn place_quick(&self, input: QuickOrder, now: DateTime<Utc>) -> ServiceResult<Order> {
        let id = OrderId::new();
        self.insert_numbered(now, |number| Order::place_quick(id, number, input.clone(), now))
            .await
    }

    pub async fn change_status(
        &self,
        id: OrderId,
        to: OrderStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        let order = self.modify(id, |order| order.change_status(to, note, now)).await?;
        info!(order_number = %order.order_number(), status = %order.status(), "order status changed");
        Ok(order)
    }

    pub async fn request_cancellation(
        &self,
        id: OrderId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        let order = self
            .modify(id, |order| order.request_cancellation(reason, now))
            .await?;
        info!(order_number = %order.order_number(), "cancellation requested");
        Ok(order)
    }

    pub async fn approve_cancellation(
        &self,
        id: OrderId,
        refund_amount: f64,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        let order = self
            .modify(id, |order| order.approve_cancellation(refund_amount, now))
            .await?;
        info!(order_number = %order.order_number(), refund_amount, status = %order.status(), "cancellation approved");
        Ok(order)
    }

    pub async fn update_refund_status(
        &self,
        id: OrderId,
        status: RefundStatus,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        let order = self
            .modify(id, |order| order.update_refund_status(status, now))
            .await?;
        info!(order_number = %order.order_number(), refund_status = ?status, "refund status updated");
        Ok(order)
    }

    pub async fn request_return(
        &self,
        id: OrderId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        let order = self.modify(id, |order| order.request_return(reason, now)).await?;
        info!(order_number = %order.order_number(), "return requested");
        Ok(order)
    }

    pub async fn decide_return(
        &self,
        id: OrderId,
        decision: ReturnStatus,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        let order = self
            .modify(id, |order| order.decide_return(decision, now))
            .await?;
        info!(order_number = %order.order_number(), decision = ?decision, status = %order.status(), "return decided");
        Ok(order)
    }

    pub async fn update_tracking(
        &self,
        id: OrderId,
        tracking: Tracking,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        self.modify(id, |order| {
            order.update_tracking(tracking, now);
            Ok(())
        })
        .await
    }

    pub async fn update_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
        transaction_id: Option<String>,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        let order = self
            .modify(id, |order| order.update_payment_status(status, transaction_id, now))
            .await?;
        info!(order_number = %order.order_number(), payment_status = ?status, "payment status updated");
        Ok(order)
    }

    pub async fn set_notes(
        &self,
        id: OrderId,
        notes: OrderNotes,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        self.modify(id, |order| order.set_notes(notes, now)).await
    }

    pub async fn set_delivery_info(
        &self,
        id: OrderId,
        info: DeliveryInfo,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        self.modify(id, |order| {
            order.set_delivery_info(info, now);
            Ok(())
        })
        .await
    }

    pub async fn get(&self, id: OrderId) -> ServiceResult<Order> {
        debug!(order_id = %id, "loading order");
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("order {id}")))
    }

    pub async fn get_by_number(&self, number: &OrderNumber) -> ServiceResult<Order> {
        let query = Query::all().filter("orderNumber", number.as_str());
        self.store
            .find(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::not_found(format!("order {number}")))
    }

    /// Orders matching `filter`, newest first. An unknown email yields an
    /// empty list.
    pub async fn list(&self, filter: OrderFilter) -> ServiceResult<Vec<Order>> {
        let query = Query::all()
            .filter_opt("user", filter.user.map(|u| u.to_string()))
            .filter_opt("email", filter.email)
            .filter_opt("status", filter.status.map(|s| s.as_str()))
            .sort_by("createdAt", SortDirection::Descending)
            .sort_by("id", SortDirection::Descending);
        let orders = self.store.find(&query).await?;
        debug!(count = orders.len(), "listed orders");
        Ok(orders)
    }

    /// Draw an order number, build the order with it and insert. A taken
    /// number is redrawn up to `max_attempts` times.
    async fn insert_numbered<F>(&self, now: DateTime<Utc>, build: F) -> ServiceResult<Order>
    where
        F: Fn(OrderNumber) -> DomainResult<Order> + Send + Sync,
    {
        for attempt in 1..=self.max_attempts {
            let number = OrderNumber::for_instant(now, self.numbers.next_suffix())?;
            let order = build(number)?;

            match self.store.insert(order).await {
                Ok(stored) => {
                    info!(
                        order_id = %stored.id_typed(),
                        order_number = %stored.order_number(),
                        items = stored.items().len(),
                        total = stored.pricing().total,
                        "order placed"
                    );
                    return Ok(stored);
                }
                Err(StoreError::UniqueViolation { field, value, .. }) if field == "orderNumber" => {
                    warn!(attempt, order_number = %value, "order number taken, drawing another");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Exhausted {
            operation: "order number generation",
            attempts: self.max_attempts,
        })
    }

    /// Snapshots for items that reference a product but carry no snapshot of
    /// their own. Lookup failures only cost the snapshot.
    async fn snapshots(&self, input: &NewOrder) -> Vec<(usize, ProductSnapshot)> {
        let mut out = Vec::new();
        for (index, item) in input.items.iter().enumerate() {
            let Some(product_id) = item.product else {
                continue;
            };
            if item.product_snapshot.as_ref().is_some_and(|s| !s.is_empty()) {
                continue;
            }
            if let Some(snapshot) = self.snapshot_of(product_id).await {
                out.push((index, snapshot));
            }
        }
        out
    }

    async fn snapshot_of(&self, product_id: ProductId) -> Option<ProductSnapshot> {
        match self.products.get(product_id).await {
            Ok(Some(product)) => Some(ProductSnapshot {
                name: Some(product.name().to_string()),
                image: product.primary_image().map(|i| i.url.clone()),
                sku: Some(product.sku().to_string()),
            }),
            Ok(None) => {
                warn!(product_id = %product_id, "ordered product not found, leaving snapshot empty");
                None
            }
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "product lookup failed, leaving snapshot empty");
                None
            }
        }
    }

    /// Single read-modify-write. A concurrent writer surfaces as a conflict.
    async fn modify<F>(&self, id: OrderId, change: F) -> ServiceResult<Order>
    where
        F: FnOnce(&mut Order) -> DomainResult<()> + Send,
    {
        let mut order = self.get(id).await?;
        let expected = ExpectedVersion::Exact(order.version());
        change(&mut order)?;
        Ok(self.store.update(order, expected).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use storefront_core::CategoryId;
    use storefront_orders::{NewOrderItem, PaymentInfo, PaymentMethod, Pricing, QuickOrderLine, ShippingAddress};
    use storefront_products::{NewProduct, ProductImage};

    use crate::numbering::SequenceSuffix;
    use crate::store::InMemoryDocumentStore;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn service() -> (OrderService, Arc<InMemoryDocumentStore<Product>>) {
        let products = Arc::new(InMemoryDocumentStore::<Product>::new());
        let svc = OrderService::new(Arc::new(InMemoryDocumentStore::<Order>::new()), products.clone());
        (svc, products)
    }

    fn checkout(product: ProductId) -> NewOrder {
        NewOrder {
            user: Some(UserId::new()),
            items: vec![NewOrderItem {
                product: Some(product),
                quantity: Some(2),
                price: Some(10.0),
                ..NewOrderItem::default()
            }],
            shipping_address: Some(ShippingAddress {
                name: "Ada Lovelace".to_string(),
                street: "1 Analytical Way".to_string(),
                city: "London".to_string(),
                state: "LDN".to_string(),
                zip_code: "N1".to_string(),
                country: "UK".to_string(),
                phone: None,
            }),
            payment_info: Some(PaymentInfo {
                method: PaymentMethod::Card,
                status: PaymentStatus::Pending,
                transaction_id: None,
                payment_date: None,
            }),
            pricing: Some(Pricing {
                subtotal: 20.0,
                shipping: 5.0,
                tax: 0.0,
                discount: 0.0,
                total: 25.0,
            }),
            ..NewOrder::default()
        }
    }

    fn quick(email: &str) -> QuickOrder {
        QuickOrder {
            email: Some(email.to_string()),
            products: vec![QuickOrderLine {
                name: Some("Mug".to_string()),
                quantity: Some(1),
                price: Some(9.5),
            }],
            order_value: Some(9.5),
        }
    }

    async fn stock_product(products: &InMemoryDocumentStore<Product>) -> ProductId {
        let product = Product::create(
            ProductId::new(),
            NewProduct {
                name: Some("Lamp".to_string()),
                description: Some("Desk lamp".to_string()),
                price: Some(10.0),
                category: Some(CategoryId::new()),
                brand: Some("Acme".to_string()),
                sku: Some("LAMP-1".to_string()),
                stock: Some(3),
                seller: Some(UserId::new()),
                images: vec![ProductImage::new("lamp.jpg")],
                ..NewProduct::default()
            },
            at(),
        )
        .unwrap();
        products.insert(product).await.unwrap().id_typed()
    }

    fn is_order_number(s: &str) -> bool {
        let parts: Vec<&str> = s.split('-').collect();
        parts.len() == 3
            && parts[0] == "ORD"
            && parts[1].len() == 8
            && parts[2].len() == 4
            && parts[1..].iter().all(|p| p.chars().all(|c| c.is_ascii_digit()))
    }

    #[tokio::test]
    async fn place_creates_pending_order_with_snapshot() {
        let (svc, products) = service();
        let product = stock_product(&products).await;

        let order = svc.place(checkout(product), at()).await.unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(is_order_number(order.order_number().as_str()), "{}", order.order_number());
        assert!(order.order_number().as_str().starts_with("ORD-20240301-"));
        assert_eq!(order.status_history().len(), 1);
        assert_eq!(order.status_history()[0].status, OrderStatus::Pending);
        assert_eq!(order.status_history()[0].note.as_deref(), Some("Order created"));

        let snapshot = &order.items()[0].product_snapshot;
        assert_eq!(snapshot.name.as_deref(), Some("Lamp"));
        assert_eq!(snapshot.image.as_deref(), Some("lamp.jpg"));
        assert_eq!(snapshot.sku.as_deref(), Some("LAMP-1"));
    }

    #[tokio::test]
    async fn unknown_product_leaves_snapshot_empty() {
        let (svc, _) = service();
        let order = svc.place(checkout(ProductId::new()), at()).await.unwrap();
        assert!(order.items()[0].product_snapshot.is_empty());
    }

    #[tokio::test]
    async fn invalid_checkout_is_rejected_before_numbering() {
        let (svc, _) = service();
        let mut input = checkout(ProductId::new());
        input.items.clear();

        let err = svc.place(input, at()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
        assert!(svc.list(OrderFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn number_collisions_are_redrawn() {
        let (svc, _) = service();
        let svc = svc.with_number_generator(Arc::new(SequenceSuffix::new([7, 7, 7, 8])));

        let first = svc.place_quick(quick("a@example.com"), at()).await.unwrap();
        let second = svc.place_quick(quick("a@example.com"), at()).await.unwrap();

        assert_eq!(first.order_number().as_str(), "ORD-20240301-0007");
        assert_eq!(second.order_number().as_str(), "ORD-20240301-0008");
    }

    #[tokio::test]
    async fn exhausted_number_space_is_an_error() {
        let (svc, _) = service();
        let svc = svc
            .with_number_generator(Arc::new(SequenceSuffix::new([1])))
            .with_max_attempts(3);

        svc.place_quick(quick("a@example.com"), at()).await.unwrap();
        let err = svc.place_quick(quick("a@example.com"), at()).await.unwrap_err();
        assert!(
            matches!(err, ServiceError::Exhausted { attempts: 3, .. }),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn status_changes_append_history_and_terminal_blocks_fulfillment() {
        let (svc, _) = service();
        let id = svc.place(checkout(ProductId::new()), at()).await.unwrap().id_typed();

        let order = svc
            .change_status(id, OrderStatus::Confirmed, Some("paid".to_string()), at())
            .await
            .unwrap();
        assert_eq!(order.status_history().len(), 2);

        let err = svc
            .change_status(id, OrderStatus::Confirmed, None, at())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "{err:?}");

        svc.change_status(id, OrderStatus::Cancelled, None, at()).await.unwrap();
        let err = svc
            .change_status(id, OrderStatus::Shipped, None, at())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "{err:?}");
        assert_eq!(svc.get(id).await.unwrap().status_history().len(), 3);
    }

    #[tokio::test]
    async fn cancellation_workflow() {
        let (svc, _) = service();
        let id = svc.place(checkout(ProductId::new()), at()).await.unwrap().id_typed();

        let err = svc.approve_cancellation(id, 5.0, at()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "{err:?}");

        svc.request_cancellation(id, "changed my mind", at()).await.unwrap();
        let err = svc.approve_cancellation(id, 100.0, at()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");

        let order = svc.approve_cancellation(id, 25.0, at()).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(
            order.cancellation().and_then(|c| c.refund_status),
            Some(RefundStatus::Pending)
        );

        let order = svc
            .update_refund_status(id, RefundStatus::Processed, at())
            .await
            .unwrap();
        assert_eq!(
            order.payment_info().map(|p| p.status),
            Some(PaymentStatus::Refunded)
        );
    }

    #[tokio::test]
    async fn return_requires_delivery() {
        let (svc, _) = service();
        let id = svc.place(checkout(ProductId::new()), at()).await.unwrap().id_typed();
        svc.change_status(id, OrderStatus::Processing, None, at()).await.unwrap();

        let err = svc.request_return(id, "broken", at()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "{err:?}");

        svc.change_status(id, OrderStatus::Delivered, None, at()).await.unwrap();
        svc.request_return(id, "broken", at()).await.unwrap();
        svc.decide_return(id, ReturnStatus::Approved, at()).await.unwrap();
        let order = svc.decide_return(id, ReturnStatus::Completed, at()).await.unwrap();

        assert_eq!(order.status(), OrderStatus::Returned);
        assert_eq!(
            order.status_history().last().map(|e| e.status),
            Some(OrderStatus::Returned)
        );
    }

    #[tokio::test]
    async fn payment_tracking_and_notes() {
        let (svc, _) = service();
        let id = svc.place(checkout(ProductId::new()), at()).await.unwrap().id_typed();

        let order = svc
            .update_payment_status(id, PaymentStatus::Completed, Some("tx-1".to_string()), at())
            .await
            .unwrap();
        let payment = order.payment_info().cloned().unwrap();
        assert_eq!(payment.transaction_id.as_deref(), Some("tx-1"));
        assert_eq!(payment.payment_date, Some(at()));

        let order = svc
            .update_tracking(
                id,
                Tracking {
                    carrier: Some("UPS".to_string()),
                    ..Tracking::default()
                },
                at(),
            )
            .await
            .unwrap();
        assert_eq!(order.tracking().carrier.as_deref(), Some("UPS"));

        let order = svc
            .set_notes(
                id,
                OrderNotes {
                    customer: Some("leave at door".to_string()),
                    admin: None,
                },
                at(),
            )
            .await
            .unwrap();
        assert_eq!(order.notes().customer.as_deref(), Some("leave at door"));

        // Quick orders carry no payment record.
        let quick_id = svc.place_quick(quick("q@example.com"), at()).await.unwrap().id_typed();
        let err = svc
            .update_payment_status(quick_id, PaymentStatus::Completed, None, at())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "{err:?}");
    }

    #[tokio::test]
    async fn listing_by_email_user_status_and_number() {
        let (svc, _) = service();
        let first = svc.place_quick(quick("a@example.com"), at()).await.unwrap();
        let later = at() + chrono::Duration::minutes(5);
        let second = svc.place_quick(quick("a@example.com"), later).await.unwrap();
        svc.place_quick(quick("b@example.com"), at()).await.unwrap();

        let mine = svc
            .list(OrderFilter {
                email: Some("a@example.com".to_string()),
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        let ids: Vec<OrderId> = mine.iter().map(|o| o.id_typed()).collect();
        assert_eq!(ids, vec![second.id_typed(), first.id_typed()]);

        let nobody = svc
            .list(OrderFilter {
                email: Some("nobody@example.com".to_string()),
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        assert!(nobody.is_empty());

        svc.change_status(first.id_typed(), OrderStatus::Shipped, None, at())
            .await
            .unwrap();
        let shipped = svc
            .list(OrderFilter {
                status: Some(OrderStatus::Shipped),
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(shipped.len(), 1);

        let placed = svc.place(checkout(ProductId::new()), at()).await.unwrap();
        let by_user = svc
            .list(OrderFilter {
                user: placed.user(),
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_user.len(), 1);

        let found = svc.get_by_number(second.order_number()).await.unwrap();
        assert_eq!(found.id_typed(), second.id_typed());

        let missing = OrderNumber::parse("ORD-19990101-0000").unwrap();
        let err = svc.get_by_number(&missing).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(svc.list(OrderFilter::default()).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn stale_writes_are_conflicts() {
        let (svc, _) = service();
        let stored = svc.place(checkout(ProductId::new()), at()).await.unwrap();

        let mut stale = stored.clone();
        svc.change_status(stored.id_typed(), OrderStatus::Confirmed, None, at())
            .await
            .unwrap();

        stale.change_status(OrderStatus::Processing, None, at()).unwrap();
        let err: ServiceError = svc
            .store
            .update(stale, ExpectedVersion::Exact(stored.version()))
            .await
            .unwrap_err()
            .into();
        assert!(matches!(err, ServiceError::Conflict(_)), "{err:?}");
    }
}
