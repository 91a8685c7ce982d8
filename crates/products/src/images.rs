use serde::{Deserialize, Serialize};

/// Product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub is_primary: bool,
}

impl ProductImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: String::new(),
            is_primary: false,
        }
    }
}

/// Normalize the primary flags of an image list.
///
/// At most one image ends up primary: when several are marked the last marked
/// one wins, and when none is marked the first image becomes primary.
pub fn apply_primary_image_rule(mut images: Vec<ProductImage>) -> Vec<ProductImage> {
    let chosen = images
        .iter()
        .rposition(|image| image.is_primary)
        .or(if images.is_empty() { None } else { Some(0) });

    for (index, image) in images.iter_mut().enumerate() {
        image.is_primary = Some(index) == chosen;
    }
    images
}

/// The primary image, if any.
pub fn primary_image(images: &[ProductImage]) -> Option<&ProductImage> {
    images.iter().find(|image| image.is_primary)
}
