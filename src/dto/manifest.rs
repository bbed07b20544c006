use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// A single (product, quantity) claim inside a manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ManifestItem {
    pub product_id: i64,
    pub quantity: i32,
}

/// A validated stock manifest: non-empty, positive quantities, no duplicate
/// products. Construction is the only way to obtain one, so every manifest
/// that reaches a service or the database has already passed these checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct StockManifest(Vec<ManifestItem>);

impl StockManifest {
    pub fn new(items: Vec<ManifestItem>) -> Result<Self, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::InvalidStockManifest(
                "manifest must contain at least one item".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.quantity <= 0 {
                return Err(ServiceError::InvalidStockManifest(format!(
                    "quantity for product {} must be positive, got {}",
                    item.product_id, item.quantity
                )));
            }
            if !seen.insert(item.product_id) {
                return Err(ServiceError::InvalidStockManifest(format!(
                    "duplicate product {} in manifest",
                    item.product_id
                )));
            }
        }
        Ok(StockManifest(items))
    }

    /// Parses a manifest out of a raw JSON value, e.g. one loaded from a
    /// stored verification row.
    pub fn from_json(value: &Value) -> Result<Self, ServiceError> {
        let items: Vec<ManifestItem> = serde_json::from_value(value.clone())
            .map_err(|e| ServiceError::MalformedManifest(e.to_string()))?;
        Self::new(items)
    }

    pub fn items(&self) -> &[ManifestItem] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_units(&self) -> i64 {
        self.0.iter().map(|i| i64::from(i.quantity)).sum()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or(Value::Array(vec![]))
    }
}

impl<'de> Deserialize<'de> for StockManifest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let items = Vec::<ManifestItem>::deserialize(deserializer)?;
        StockManifest::new(items).map_err(serde::de::Error::custom)
    }
}

impl IntoIterator for StockManifest {
    type Item = ManifestItem;
    type IntoIter = std::vec::IntoIter<ManifestItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn item(product_id: i64, quantity: i32) -> ManifestItem {
        ManifestItem {
            product_id,
            quantity,
        }
    }

    #[test]
    fn accepts_valid_manifest() {
        let m = StockManifest::new(vec![item(1, 5), item(2, 3)]).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.total_units(), 8);
    }

    #[test]
    fn rejects_empty_manifest() {
        assert_matches!(
            StockManifest::new(vec![]),
            Err(ServiceError::InvalidStockManifest(_))
        );
    }

    #[test]
    fn rejects_non_positive_quantity() {
        assert_matches!(
            StockManifest::new(vec![item(1, 0)]),
            Err(ServiceError::InvalidStockManifest(_))
        );
        assert_matches!(
            StockManifest::new(vec![item(1, -4)]),
            Err(ServiceError::InvalidStockManifest(_))
        );
    }

    #[test]
    fn rejects_duplicate_product() {
        assert_matches!(
            StockManifest::new(vec![item(7, 1), item(7, 2)]),
            Err(ServiceError::InvalidStockManifest(_))
        );
    }

    #[test]
    fn from_json_rejects_wrong_shape() {
        let bad = serde_json::json!({"product_id": 1, "quantity": 2});
        assert_matches!(
            StockManifest::from_json(&bad),
            Err(ServiceError::MalformedManifest(_))
        );
    }

    #[test]
    fn json_round_trip_preserves_items() {
        let m = StockManifest::new(vec![item(1, 5), item(9, 12)]).unwrap();
        let back = StockManifest::from_json(&m.to_json()).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn deserialize_enforces_validation() {
        let result: Result<StockManifest, _> =
            serde_json::from_str(r#"[{"product_id": 1, "quantity": -1}]"#);
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn valid_inputs_always_parse(quantities in prop::collection::vec(1..10_000i32, 1..20)) {
            let items: Vec<ManifestItem> = quantities
                .iter()
                .enumerate()
                .map(|(idx, q)| item(idx as i64 + 1, *q))
                .collect();
            let manifest = StockManifest::new(items.clone()).unwrap();
            prop_assert_eq!(manifest.items(), items.as_slice());
            prop_assert_eq!(
                manifest.total_units(),
                quantities.iter().map(|q| i64::from(*q)).sum::<i64>()
            );
        }

        #[test]
        fn any_zero_or_negative_quantity_is_rejected(
            quantities in prop::collection::vec(-100..10_000i32, 1..20)
        ) {
            let items: Vec<ManifestItem> = quantities
                .iter()
                .enumerate()
                .map(|(idx, q)| item(idx as i64 + 1, *q))
                .collect();
            let has_invalid = quantities.iter().any(|q| *q <= 0);
            prop_assert_eq!(StockManifest::new(items).is_err(), has_invalid);
        }
    }
}
