use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult};

/// A named variant axis (e.g. "Size") and its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub options: Vec<VariantOption>,
}

/// One choice within a variant axis, with its own stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantOption {
    pub value: String,
    pub stock: i64,
    /// Price override for this option.
    #[serde(default)]
    pub price: Option<f64>,
}

/// Which stock counter an adjustment targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "lowercase")]
pub enum StockTarget {
    /// The product-level `stock` counter.
    Root,
    /// A single variant option, addressed by variant name and option value.
    Variant { variant: String, option: String },
}

/// Apply `delta` to a counter, refusing to go below zero.
pub fn apply_delta(current: i64, delta: i64, what: &str) -> DomainResult<i64> {
    let next = current
        .checked_add(delta)
        .ok_or_else(|| DomainError::validation(format!("stock for {what} overflows")))?;
    if next < 0 {
        return Err(DomainError::conflict(format!(
            "insufficient stock for {what} (available: {current}, requested change: {delta})"
        )));
    }
    Ok(next)
}

/// Locate the option a target points at.
pub fn find_option_mut<'a>(
    variants: &'a mut [Variant],
    variant: &str,
    value: &str,
) -> DomainResult<&'a mut VariantOption> {
    variants
        .iter_mut()
        .find(|v| v.name == variant)
        .ok_or_else(|| DomainError::not_found(format!("variant {variant}")))?
        .options
        .iter_mut()
        .find(|o| o.value == value)
        .ok_or_else(|| DomainError::not_found(format!("option {value} of variant {variant}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes() -> Vec<Variant> {
        vec![Variant {
            name: "Size".to_string(),
            options: vec![
                VariantOption { value: "S".to_string(), stock: 3, price: None },
                VariantOption { value: "L".to_string(), stock: 0, price: Some(12.5) },
            ],
        }]
    }

    #[test]
    fn delta_underflow_is_conflict() {
        assert_eq!(apply_delta(3, -3, "root").unwrap(), 0);
        assert_eq!(apply_delta(3, 4, "root").unwrap(), 7);

        match apply_delta(3, -4, "root").unwrap_err() {
            DomainError::Conflict(_) => {}
            _ => panic!("expected conflict"),
        }
    }

    #[test]
    fn find_option_reports_missing_variant_or_option() {
        let mut variants = sizes();

        assert_eq!(find_option_mut(&mut variants, "Size", "S").unwrap().stock, 3);
        assert!(matches!(
            find_option_mut(&mut variants, "Color", "S").unwrap_err(),
            DomainError::NotFound(_)
        ));
        assert!(matches!(
            find_option_mut(&mut variants, "Size", "XL").unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn target_wire_format() {
        let root: StockTarget = serde_json::from_str(r#"{"target":"root"}"#).unwrap();
        assert_eq!(root, StockTarget::Root);

        let opt: StockTarget =
            serde_json::from_str(r#"{"target":"variant","variant":"Size","option":"S"}"#).unwrap();
        assert_eq!(
            opt,
            StockTarget::Variant { variant: "Size".to_string(), option: "S".to_string() }
        );
    }
}
