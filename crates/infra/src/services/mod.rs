//! Store operations for categories, products and orders.
//!
//! Each service validates through the domain types, then performs a single
//! version-checked write. Time is passed in by the caller.

mod categories;
mod error;
mod orders;
mod products;

pub use categories::{CategoryFilter, CategoryService};
pub use error::{ServiceError, ServiceResult};
pub use orders::{OrderFilter, OrderService};
pub use products::{ProductFilter, ProductService};
