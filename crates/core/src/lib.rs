//! `storefront-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod document;
pub mod error;
pub mod field;
pub mod id;

pub use document::{Document, ExpectedVersion, UniqueKey};
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, OrderId, ProductId, ReviewId, UserId};
