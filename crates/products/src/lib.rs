//! `storefront-products`: product documents, ratings, images and stock rules.

pub mod images;
pub mod product;
pub mod ratings;
pub mod stock;

pub use images::{ProductImage, apply_primary_image_rule};
pub use product::{
    Dimensions, NewProduct, NewReview, Product, ProductPatch, QuickProduct, ShippingInfo,
    Specification,
};
pub use ratings::{Ratings, Review, recompute_ratings};
pub use stock::{StockTarget, Variant, VariantOption};
