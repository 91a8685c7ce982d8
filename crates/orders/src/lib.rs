//! `storefront-orders`: order documents, numbering and the status lifecycle.

pub mod number;
pub mod order;
pub mod status;

pub use number::{OrderNumber, OrderNumberGenerator};
pub use order::{
    Cancellation, DeliveryInfo, DiscountCode, DiscountKind, NewOrder, NewOrderItem, Order,
    OrderItem, OrderNotes, PaymentInfo, PaymentMethod, PaymentStatus, Pricing, ProductSnapshot,
    QuickOrder, QuickOrderLine, RefundStatus, ReturnRequest, ReturnStatus, SelectedVariant,
    ShippingAddress, Tracking,
};
pub use status::{OrderStatus, StatusEntry};
