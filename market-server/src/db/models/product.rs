//! Product Model

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Product ID type
pub type ProductId = RecordId;

/// Catalog item (achar, papad, chutney)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<ProductId>,
    pub name: String,
    /// Catalog category, e.g. "Achar", "Papad", "Chutney"
    pub category: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    /// Unit price, 2 decimal places
    pub price: f64,
    /// Units in stock; never negative
    pub stock: i32,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_available: bool,
    /// Discount percentage (0-100)
    #[serde(default)]
    pub discount: f64,
    /// ISO date "YYYY-MM-DD"
    pub expiry_date: Option<String>,
    /// ISO date "YYYY-MM-DD"
    pub manufacturing_date: Option<String>,
    /// Relative URL of the product image ("/uploads/<name>")
    pub image: Option<String>,
    pub qr_code: Option<String>,
    /// Pack size in grams
    pub amount: Option<f64>,
    /// Customization metadata
    pub oil_type: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_customizable: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

/// Create product payload (image arrives separately via multipart)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub available: Option<bool>,
    pub discount: Option<f64>,
    pub expiry_date: Option<String>,
    pub manufacturing_date: Option<String>,
    pub qr_code: Option<String>,
    pub amount: Option<f64>,
    pub oil_type: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub is_customizable: Option<bool>,
}

/// Update product payload; absent fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i32>,
    pub available: Option<bool>,
    pub discount: Option<f64>,
    pub expiry_date: Option<String>,
    pub manufacturing_date: Option<String>,
    pub qr_code: Option<String>,
    pub amount: Option<f64>,
    pub oil_type: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub is_customizable: Option<bool>,
}

impl Product {
    /// Build a product from a create payload, stamping timestamps
    pub fn from_create(data: ProductCreate, image: Option<String>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: None,
            name: data.name,
            category: data.category,
            description: data.description,
            brand: data.brand,
            price: data.price,
            stock: data.stock,
            is_available: data.available.unwrap_or(true),
            discount: data.discount.unwrap_or(0.0),
            expiry_date: data.expiry_date,
            manufacturing_date: data.manufacturing_date,
            image,
            qr_code: data.qr_code,
            amount: data.amount,
            oil_type: data.oil_type,
            ingredients: data.ingredients.unwrap_or_default(),
            is_customizable: data.is_customizable.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }

    fn parse_date(value: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
    }

    /// True when the expiry date lies strictly before `today`
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date
            .as_deref()
            .and_then(Self::parse_date)
            .map(|expiry| expiry < today)
            .unwrap_or(false)
    }

    /// Date validation run explicitly by the repository on every write:
    /// expiry before manufacture is rejected; a past expiry or an empty
    /// shelf forces the product unavailable.
    pub fn validate_and_sync(&mut self, today: NaiveDate) -> Result<(), String> {
        if let (Some(expiry), Some(manufacture)) = (
            self.expiry_date.as_deref().and_then(Self::parse_date),
            self.manufacturing_date.as_deref().and_then(Self::parse_date),
        ) && expiry < manufacture
        {
            return Err(format!(
                "expiry_date {} precedes manufacturing_date {}",
                expiry, manufacture
            ));
        }

        if self.stock <= 0 || self.is_expired(today) {
            self.is_available = false;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product::from_create(
            ProductCreate {
                name: "Mango Achar".to_string(),
                category: "Achar".to_string(),
                price: 150.0,
                stock: 10,
                ..Default::default()
            },
            None,
        )
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_expiry_before_manufacture_rejected() {
        let mut product = sample();
        product.manufacturing_date = Some("2026-06-01".to_string());
        product.expiry_date = Some("2026-01-01".to_string());
        assert!(product.validate_and_sync(day("2025-12-01")).is_err());
    }

    #[test]
    fn test_past_expiry_forces_unavailable() {
        let mut product = sample();
        product.expiry_date = Some("2025-01-01".to_string());
        product.validate_and_sync(day("2025-06-01")).unwrap();
        assert!(!product.is_available);
    }

    #[test]
    fn test_zero_stock_forces_unavailable() {
        let mut product = sample();
        product.stock = 0;
        product.validate_and_sync(day("2025-06-01")).unwrap();
        assert!(!product.is_available);
    }

    #[test]
    fn test_valid_product_stays_available() {
        let mut product = sample();
        product.manufacturing_date = Some("2025-01-01".to_string());
        product.expiry_date = Some("2027-01-01".to_string());
        product.validate_and_sync(day("2025-06-01")).unwrap();
        assert!(product.is_available);
    }
}
