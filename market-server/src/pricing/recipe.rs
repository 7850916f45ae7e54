//! Custom recipe price calculator
//!
//! Pure function:
//! `total = base + ingredient_count × unit + oil_premium + spice_cost`
//!
//! Oil premium is a flat surcharge for the two premium oils (sesame,
//! olive); spice cost is a step function of the spice level. Unknown
//! oil types and spice levels cost nothing.

use rust_decimal::Decimal;
use serde::Serialize;

use super::{to_decimal, to_f64};

/// Cost per ingredient
const INGREDIENT_BASE_COST: f64 = 10.0;

/// Flat surcharge for premium oil types
const OIL_TYPE_PREMIUM: f64 = 20.0;

/// Cost per spice level increment above mild
const SPICE_LEVEL_COST: f64 = 5.0;

/// Component breakdown of a calculated recipe price
#[derive(Debug, Clone, Serialize)]
pub struct RecipePriceBreakdown {
    pub base_price: f64,
    pub ingredients_cost: f64,
    pub oil_type_cost: f64,
    pub spice_level_cost: f64,
    pub total_price: f64,
    /// Human-readable summary line
    pub breakdown: String,
}

fn ingredients_cost(ingredients: &[String]) -> Decimal {
    to_decimal(INGREDIENT_BASE_COST) * Decimal::from(ingredients.len() as i64)
}

fn oil_type_cost(oil_type: Option<&str>) -> Decimal {
    match oil_type {
        Some(oil) if oil.eq_ignore_ascii_case("sesame") || oil.eq_ignore_ascii_case("olive") => {
            to_decimal(OIL_TYPE_PREMIUM)
        }
        // Default oils (mustard, groundnut, ...) carry no surcharge
        _ => Decimal::ZERO,
    }
}

fn spice_level_cost(spice_level: Option<&str>) -> Decimal {
    let multiplier = match spice_level.map(str::to_lowercase).as_deref() {
        Some("medium") => 1,
        Some("hot") => 2,
        Some("extra-hot") => 3,
        // mild, absent, or unrecognized
        _ => 0,
    };
    to_decimal(SPICE_LEVEL_COST) * Decimal::from(multiplier)
}

/// Calculate the full price breakdown for a recipe configuration
pub fn calculate_recipe_price(
    base_price: f64,
    ingredients: &[String],
    oil_type: Option<&str>,
    spice_level: Option<&str>,
) -> RecipePriceBreakdown {
    let base = to_decimal(base_price);
    let ingredients_cost = ingredients_cost(ingredients);
    let oil_cost = oil_type_cost(oil_type);
    let spice_cost = spice_level_cost(spice_level);

    let total = base + ingredients_cost + oil_cost + spice_cost;

    let breakdown = format!(
        "Base Price: ₹{:.2} + Ingredients ({}): ₹{:.2} + Oil Type ({}): ₹{:.2} + Spice Level ({}): ₹{:.2} = Total: ₹{:.2}",
        to_f64(base),
        ingredients.len(),
        to_f64(ingredients_cost),
        oil_type.unwrap_or("default"),
        to_f64(oil_cost),
        spice_level.unwrap_or("mild"),
        to_f64(spice_cost),
        to_f64(total),
    );

    RecipePriceBreakdown {
        base_price: to_f64(base),
        ingredients_cost: to_f64(ingredients_cost),
        oil_type_cost: to_f64(oil_cost),
        spice_level_cost: to_f64(spice_cost),
        total_price: to_f64(total),
        breakdown,
    }
}

/// Total price only, with an optional caller override
///
/// A supplied `custom_price` replaces the computed total entirely; no
/// floor against the computed cost is applied.
pub fn recipe_total_price(
    base_price: f64,
    ingredients: &[String],
    oil_type: Option<&str>,
    spice_level: Option<&str>,
    custom_price: Option<f64>,
) -> f64 {
    if let Some(custom) = custom_price {
        return to_f64(to_decimal(custom));
    }
    calculate_recipe_price(base_price, ingredients, oil_type, spice_level).total_price
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredients(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("ingredient-{i}")).collect()
    }

    #[test]
    fn test_base_only() {
        let price = calculate_recipe_price(100.0, &[], None, None);
        assert_eq!(price.total_price, 100.0);
        assert_eq!(price.ingredients_cost, 0.0);
        assert_eq!(price.oil_type_cost, 0.0);
        assert_eq!(price.spice_level_cost, 0.0);
    }

    #[test]
    fn test_ingredient_count_scales_linearly() {
        let price = calculate_recipe_price(50.0, &ingredients(4), None, None);
        assert_eq!(price.ingredients_cost, 40.0);
        assert_eq!(price.total_price, 90.0);
    }

    #[test]
    fn test_premium_oils_surcharge() {
        for oil in ["sesame", "Sesame", "olive", "OLIVE"] {
            let price = calculate_recipe_price(50.0, &[], Some(oil), None);
            assert_eq!(price.oil_type_cost, 20.0, "oil {oil} must carry the premium");
        }
        for oil in ["mustard", "groundnut", "coconut"] {
            let price = calculate_recipe_price(50.0, &[], Some(oil), None);
            assert_eq!(price.oil_type_cost, 0.0, "oil {oil} must be free");
        }
    }

    #[test]
    fn test_spice_level_step_function() {
        let cases = [
            (Some("mild"), 0.0),
            (Some("medium"), 5.0),
            (Some("hot"), 10.0),
            (Some("extra-hot"), 15.0),
            (Some("nuclear"), 0.0),
            (None, 0.0),
        ];
        for (level, expected) in cases {
            let price = calculate_recipe_price(0.0, &[], None, level);
            assert_eq!(price.spice_level_cost, expected, "level {level:?}");
        }
    }

    #[test]
    fn test_mild_to_hot_delta_is_two_units() {
        let mild = calculate_recipe_price(120.0, &ingredients(3), Some("mustard"), Some("mild"));
        let hot = calculate_recipe_price(120.0, &ingredients(3), Some("mustard"), Some("hot"));
        assert_eq!(hot.total_price - mild.total_price, 10.0);
    }

    #[test]
    fn test_deterministic() {
        let a = calculate_recipe_price(99.5, &ingredients(5), Some("sesame"), Some("extra-hot"));
        let b = calculate_recipe_price(99.5, &ingredients(5), Some("sesame"), Some("extra-hot"));
        assert_eq!(a.total_price, b.total_price);
        assert_eq!(a.total_price, 99.5 + 50.0 + 20.0 + 15.0);
    }

    #[test]
    fn test_custom_price_overrides_everything() {
        let total = recipe_total_price(100.0, &ingredients(5), Some("olive"), Some("hot"), Some(1.0));
        assert_eq!(total, 1.0);
    }

    #[test]
    fn test_breakdown_string_mentions_components() {
        let price = calculate_recipe_price(100.0, &ingredients(2), Some("sesame"), Some("hot"));
        assert!(price.breakdown.contains("Ingredients (2)"));
        assert!(price.breakdown.contains("sesame"));
        assert!(price.breakdown.contains("hot"));
        assert!(price.breakdown.contains("Total"));
    }
}
