//! `storefront-categories`: category documents and slug derivation.

pub mod category;
pub mod slug;

pub use category::{Category, CategoryPatch, NewCategory, ensure_not_descendant, listing_order};
pub use slug::derive_slug;
