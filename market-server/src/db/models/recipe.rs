//! Custom Recipe Model

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Recipe ID type
pub type RecipeId = RecordId;

/// Recipe lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeStatus {
    #[serde(rename = "DRAFT")]
    Draft,
    #[serde(rename = "SAVED")]
    Saved,
    #[serde(rename = "ORDERED")]
    Ordered,
    #[serde(rename = "SHARED")]
    Shared,
}

/// User-owned pickle configuration with a computed price and a share token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRecipe {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecipeId>,
    pub name: String,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// mustard, sesame, groundnut, ...
    pub oil_type: Option<String>,
    /// mild, medium, hot, extra-hot
    pub spice_level: Option<String>,
    /// Full recipe configuration as opaque JSON
    pub recipe_json: Option<String>,
    pub base_price: f64,
    pub total_price: f64,
    /// Opaque token granting public read-only access
    pub share_token: String,
    pub status: RecipeStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CustomRecipe {
    /// Generate an opaque share token: "RECIPE_<millis>_<4 digits>"
    pub fn generate_share_token() -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen_range(0..10000);
        format!("RECIPE_{}_{}", millis, suffix)
    }
}

/// Create/update request; update treats absent fields as "keep current"
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomRecipeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub oil_type: Option<String>,
    pub spice_level: Option<String>,
    pub recipe_json: Option<String>,
    pub base_price: Option<f64>,
    /// Overrides the computed total entirely when present
    pub custom_price: Option<f64>,
}

/// Price calculation request (no persistence)
#[derive(Debug, Clone, Deserialize)]
pub struct RecipePriceCalculationRequest {
    pub base_price: f64,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub oil_type: Option<String>,
    pub spice_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_token_shape() {
        let token = CustomRecipe::generate_share_token();
        assert!(token.starts_with("RECIPE_"));
        let parts: Vec<&str> = token.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(parts[2].parse::<u32>().unwrap() < 10000);
    }
}
