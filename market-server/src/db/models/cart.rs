//! Cart Models

use chrono::Utc;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Cart ID type
pub type CartId = RecordId;

/// Per-user mutable cart (1:1 with user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<CartId>,
    /// Owning user
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Cart {
    pub fn new(user: RecordId) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: None,
            user,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Cart line: one product per cart, price frozen at first insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub cart: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub quantity: i32,
    /// Catalog price captured when the line was created; later catalog
    /// price changes never touch it
    pub price_at_add: f64,
    pub customization_notes: Option<String>,
    pub added_at: i64,
}

/// Add-to-cart request
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemAdd {
    /// "product:xxxx"
    pub product_id: String,
    pub quantity: i32,
    pub customization_notes: Option<String>,
}

/// Quantity update request
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemQuantityUpdate {
    pub quantity: i32,
}

/// Cart view returned to clients: cart plus its lines and totals
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub items: Vec<CartItem>,
    pub items_count: i32,
    pub total: f64,
}
