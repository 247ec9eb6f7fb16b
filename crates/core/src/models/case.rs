//! Phone-case inventory (`fundas`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{null_as_default, require};
use crate::schema::{
    Column, ColumnDefault, ColumnType, Draft, Entity, Index, SortField, TableSchema,
    ValidationError,
};
use crate::types::{CaseId, CurrencyCode, Price};

pub static CASES_TABLE: TableSchema = TableSchema {
    name: "fundas",
    columns: &[
        Column::id(),
        Column::new("name", ColumnType::Text).not_null(),
        Column::new("phone_model", ColumnType::Text).not_null(),
        Column::new("material", ColumnType::Text),
        Column::new("color", ColumnType::Text),
        Column::new("price", ColumnType::Numeric)
            .not_null()
            .with_default(ColumnDefault::Int(0)),
        Column::new("image_url", ColumnType::Text),
        Column::new("description", ColumnType::Text),
        Column::new("stock", ColumnType::Integer).with_default(ColumnDefault::Int(0)),
        Column::new("brand", ColumnType::Text),
        Column::new("features", ColumnType::TextArray),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
    indexes: &[
        Index {
            name: "idx_fundas_phone_model",
            column: "phone_model",
        },
        Index {
            name: "idx_fundas_material",
            column: "material",
        },
        Index {
            name: "idx_fundas_color",
            column: "color",
        },
    ],
    searchable: &["name", "phone_model", "color", "brand"],
    filterable: &["phone_model", "material", "price"],
    update_key: "id",
    updatable: &[
        "name",
        "phone_model",
        "material",
        "color",
        "price",
        "image_url",
        "description",
        "stock",
        "brand",
        "features",
    ],
    default_order: SortField::NEWEST_FIRST,
    filter_order: SortField::asc("price"),
};

/// A phone case in inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: CaseId,
    pub name: String,
    pub phone_model: String,
    pub material: Option<String>,
    pub color: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: i32,
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CaseRecord {
    /// Unit price in the given currency.
    #[must_use]
    pub const fn unit_price(&self, currency: CurrencyCode) -> Price {
        Price::new(self.price, currency)
    }

    /// Value of the units on hand.
    #[must_use]
    pub fn stock_value(&self) -> Decimal {
        self.price * Decimal::from(self.stock)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl Entity for CaseRecord {
    type Draft = CaseDraft;

    fn schema() -> &'static TableSchema {
        &CASES_TABLE
    }
}

/// Insert payload for a phone case.
///
/// `price` and `stock` default to zero when omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDraft {
    pub name: String,
    pub phone_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl CaseDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, phone_model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone_model: phone_model.into(),
            ..Self::default()
        }
    }
}

impl Draft for CaseDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("phone_model", &self.phone_model)?;
        if self.price.is_some_and(|p| p.is_sign_negative() && !p.is_zero()) {
            return Err(ValidationError::Negative("price"));
        }
        if self.stock.is_some_and(|s| s < 0) {
            return Err(ValidationError::Negative("stock"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_name_and_model() {
        assert_eq!(
            CaseDraft::new("  ", "iPhone 16").validate(),
            Err(ValidationError::Blank("name"))
        );
        assert_eq!(
            CaseDraft::new("Funda", "").validate(),
            Err(ValidationError::Blank("phone_model"))
        );
        assert!(CaseDraft::new("Funda", "iPhone 16").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_numbers() {
        let mut draft = CaseDraft::new("Funda", "iPhone 16");
        draft.price = Some(Decimal::new(-1, 0));
        assert_eq!(draft.validate(), Err(ValidationError::Negative("price")));

        draft.price = Some(Decimal::ZERO);
        draft.stock = Some(-3);
        assert_eq!(draft.validate(), Err(ValidationError::Negative("stock")));
    }

    #[test]
    fn test_draft_omits_unset_fields() {
        let json = serde_json::to_value(CaseDraft::new("Funda", "iPhone 16")).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(!obj.contains_key("price"));
    }

    #[test]
    fn test_record_from_row_with_nulls() {
        let row = serde_json::json!({
            "id": "6f1c2a9e-3b1d-4c55-9a51-0b0f5c3d2e11",
            "name": "Funda Minimalista",
            "phone_model": "Phone 16 Pro",
            "material": null,
            "color": "Blanco",
            "price": 149.0,
            "image_url": null,
            "description": null,
            "stock": null,
            "brand": "Peel",
            "features": null,
            "created_at": "2025-01-10T12:00:00Z",
            "updated_at": "2025-01-10T12:00:00+00:00"
        });
        let record: CaseRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.stock, 0);
        assert!(record.features.is_empty());
        assert_eq!(record.price, Decimal::new(149, 0));
        assert!(!record.in_stock());
    }

    #[test]
    fn test_stock_value() {
        let row = serde_json::json!({
            "id": "6f1c2a9e-3b1d-4c55-9a51-0b0f5c3d2e11",
            "name": "Funda Silicona Suave",
            "phone_model": "iPhone 16",
            "price": "299.00",
            "stock": 50,
            "created_at": "2025-01-10T12:00:00Z",
            "updated_at": "2025-01-10T12:00:00Z"
        });
        let record: CaseRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.stock_value(), Decimal::new(14950, 0));
        assert_eq!(record.unit_price(CurrencyCode::MXN).display(), "$299.00");
    }
}
