//! Custom Recipe Repository
//!
//! Owner-scoped CRUD over custom pickle recipes. Prices are recomputed
//! from the merged configuration on every write unless the caller
//! supplies an explicit override.

use chrono::Utc;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id_for};
use crate::db::models::{CustomRecipe, CustomRecipeRequest, RecipeStatus};
use crate::pricing::recipe::recipe_total_price;

const RECIPE_TABLE: &str = "custom_recipe";

#[derive(Clone)]
pub struct RecipeRepository {
    base: BaseRepository,
}

impl RecipeRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a draft recipe for the caller
    pub async fn create(&self, user: &RecordId, data: CustomRecipeRequest) -> RepoResult<CustomRecipe> {
        let name = data
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| RepoError::Validation("name is required".to_string()))?;

        let ingredients = data.ingredients.unwrap_or_default();
        let base_price = data.base_price.unwrap_or(0.0);
        if base_price < 0.0 {
            return Err(RepoError::Validation("base_price must be non-negative".into()));
        }

        let total_price = recipe_total_price(
            base_price,
            &ingredients,
            data.oil_type.as_deref(),
            data.spice_level.as_deref(),
            data.custom_price,
        );

        let now = Utc::now().timestamp();
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE custom_recipe SET
                    name = $name,
                    user = $user,
                    description = $description,
                    ingredients = $ingredients,
                    oil_type = $oil_type,
                    spice_level = $spice_level,
                    recipe_json = $recipe_json,
                    base_price = $base_price,
                    total_price = $total_price,
                    share_token = $share_token,
                    status = $status,
                    created_at = $now,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("name", name))
            .bind(("user", user.clone()))
            .bind(("description", data.description))
            .bind(("ingredients", ingredients))
            .bind(("oil_type", data.oil_type))
            .bind(("spice_level", data.spice_level))
            .bind(("recipe_json", data.recipe_json))
            .bind(("base_price", base_price))
            .bind(("total_price", total_price))
            .bind(("share_token", CustomRecipe::generate_share_token()))
            .bind(("status", RecipeStatus::Draft))
            .bind(("now", now))
            .await?;

        let created: Option<CustomRecipe> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create recipe".to_string()))
    }

    /// Update an owned recipe, recomputing the price from the merge of
    /// old and new configuration
    pub async fn update(
        &self,
        id: &str,
        caller: &RecordId,
        data: CustomRecipeRequest,
    ) -> RepoResult<CustomRecipe> {
        let mut recipe = self.owned(id, caller, "update").await?;

        if let Some(v) = data.name {
            recipe.name = v;
        }
        if let Some(v) = data.description {
            recipe.description = Some(v);
        }
        if let Some(v) = data.ingredients {
            recipe.ingredients = v;
        }
        if let Some(v) = data.oil_type {
            recipe.oil_type = Some(v);
        }
        if let Some(v) = data.spice_level {
            recipe.spice_level = Some(v);
        }
        if let Some(v) = data.recipe_json {
            recipe.recipe_json = Some(v);
        }
        if let Some(v) = data.base_price {
            if v < 0.0 {
                return Err(RepoError::Validation("base_price must be non-negative".into()));
            }
            recipe.base_price = v;
        }

        recipe.total_price = recipe_total_price(
            recipe.base_price,
            &recipe.ingredients,
            recipe.oil_type.as_deref(),
            recipe.spice_level.as_deref(),
            data.custom_price,
        );
        recipe.updated_at = Utc::now().timestamp();

        let thing = recipe
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Recipe row without id".to_string()))?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    name = $name,
                    description = $description,
                    ingredients = $ingredients,
                    oil_type = $oil_type,
                    spice_level = $spice_level,
                    recipe_json = $recipe_json,
                    base_price = $base_price,
                    total_price = $total_price,
                    updated_at = $updated_at
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("name", recipe.name))
            .bind(("description", recipe.description))
            .bind(("ingredients", recipe.ingredients))
            .bind(("oil_type", recipe.oil_type))
            .bind(("spice_level", recipe.spice_level))
            .bind(("recipe_json", recipe.recipe_json))
            .bind(("base_price", recipe.base_price))
            .bind(("total_price", recipe.total_price))
            .bind(("updated_at", recipe.updated_at))
            .await?;

        result
            .take::<Option<CustomRecipe>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Recipe {} not found", id)))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<CustomRecipe>> {
        let thing = parse_record_id_for(RECIPE_TABLE, id)?;
        let recipe: Option<CustomRecipe> = self.base.db().select(thing).await?;
        Ok(recipe)
    }

    /// All recipes owned by the caller, newest first
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<CustomRecipe>> {
        let recipes: Vec<CustomRecipe> = self
            .base
            .db()
            .query("SELECT * FROM custom_recipe WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user.clone()))
            .await?
            .take(0)?;
        Ok(recipes)
    }

    /// Caller's recipes in a given status
    pub async fn find_by_user_and_status(
        &self,
        user: &RecordId,
        status: RecipeStatus,
    ) -> RepoResult<Vec<CustomRecipe>> {
        let recipes: Vec<CustomRecipe> = self
            .base
            .db()
            .query(
                "SELECT * FROM custom_recipe WHERE user = $user AND status = $status ORDER BY created_at DESC",
            )
            .bind(("user", user.clone()))
            .bind(("status", status))
            .await?
            .take(0)?;
        Ok(recipes)
    }

    /// Public read by share token
    pub async fn find_by_share_token(&self, token: &str) -> RepoResult<CustomRecipe> {
        let token_owned = token.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM custom_recipe WHERE share_token = $token LIMIT 1")
            .bind(("token", token_owned))
            .await?;
        let recipes: Vec<CustomRecipe> = result.take(0)?;
        recipes
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound("Recipe not found".to_string()))
    }

    /// Owner-only status transition (DRAFT → SAVED / SHARED / ORDERED)
    pub async fn set_status(
        &self,
        id: &str,
        caller: &RecordId,
        status: RecipeStatus,
    ) -> RepoResult<CustomRecipe> {
        let recipe = self.owned(id, caller, "modify").await?;
        let thing = recipe
            .id
            .ok_or_else(|| RepoError::Database("Recipe row without id".to_string()))?;

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET status = $status, updated_at = $now RETURN AFTER")
            .bind(("thing", thing))
            .bind(("status", status))
            .bind(("now", Utc::now().timestamp()))
            .await?;
        result
            .take::<Option<CustomRecipe>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Recipe {} not found", id)))
    }

    /// Owner-only delete
    pub async fn delete(&self, id: &str, caller: &RecordId) -> RepoResult<()> {
        let recipe = self.owned(id, caller, "delete").await?;
        let thing = recipe
            .id
            .ok_or_else(|| RepoError::Database("Recipe row without id".to_string()))?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(())
    }

    async fn owned(&self, id: &str, caller: &RecordId, action: &str) -> RepoResult<CustomRecipe> {
        let recipe = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Recipe {} not found", id)))?;
        if recipe.user != *caller {
            return Err(RepoError::BusinessRule(format!(
                "Not authorized to {} this recipe",
                action
            )));
        }
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::engine::local::Mem;

    async fn test_repo() -> RecipeRepository {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        RecipeRepository::new(db)
    }

    fn user_id(key: &str) -> RecordId {
        RecordId::from_table_key("user", key)
    }

    fn request(name: &str, base: f64, spice: &str) -> CustomRecipeRequest {
        CustomRecipeRequest {
            name: Some(name.to_string()),
            base_price: Some(base),
            ingredients: Some(vec!["mango".to_string(), "chilli".to_string()]),
            oil_type: Some("mustard".to_string()),
            spice_level: Some(spice.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_computes_price_and_token() {
        let repo = test_repo().await;
        let user = user_id("u1");

        let recipe = repo.create(&user, request("Nani's Mango", 100.0, "hot")).await.unwrap();
        // 100 + 2×10 + 0 + 10
        assert_eq!(recipe.total_price, 130.0);
        assert_eq!(recipe.status, RecipeStatus::Draft);
        assert!(recipe.share_token.starts_with("RECIPE_"));
    }

    #[tokio::test]
    async fn test_custom_price_overrides() {
        let repo = test_repo().await;
        let user = user_id("u1");

        let mut req = request("Cheap", 100.0, "hot");
        req.custom_price = Some(5.0);
        let recipe = repo.create(&user, req).await.unwrap();
        assert_eq!(recipe.total_price, 5.0);
    }

    #[tokio::test]
    async fn test_update_recomputes_from_merged_fields() {
        let repo = test_repo().await;
        let user = user_id("u1");
        let recipe = repo.create(&user, request("Nani's Mango", 100.0, "mild")).await.unwrap();
        let id = recipe.id.as_ref().unwrap().to_string();

        let updated = repo
            .update(
                &id,
                &user,
                CustomRecipeRequest {
                    spice_level: Some("hot".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // mild → hot on otherwise unchanged config adds exactly 10
        assert_eq!(updated.total_price - recipe.total_price, 10.0);
    }

    #[tokio::test]
    async fn test_only_owner_may_modify() {
        let repo = test_repo().await;
        let owner = user_id("owner");
        let stranger = user_id("stranger");
        let recipe = repo.create(&owner, request("Mine", 50.0, "mild")).await.unwrap();
        let id = recipe.id.as_ref().unwrap().to_string();

        assert!(matches!(
            repo.set_status(&id, &stranger, RecipeStatus::Saved).await,
            Err(RepoError::BusinessRule(_))
        ));
        assert!(repo.delete(&id, &stranger).await.is_err());
        assert!(repo.set_status(&id, &owner, RecipeStatus::Saved).await.is_ok());
    }

    #[tokio::test]
    async fn test_share_token_lookup() {
        let repo = test_repo().await;
        let user = user_id("u1");
        let recipe = repo.create(&user, request("Shared", 10.0, "mild")).await.unwrap();

        let found = repo.find_by_share_token(&recipe.share_token).await.unwrap();
        assert_eq!(found.id, recipe.id);
        assert!(repo.find_by_share_token("RECIPE_0_0").await.is_err());
    }

    #[tokio::test]
    async fn test_status_filter() {
        let repo = test_repo().await;
        let user = user_id("u1");
        let a = repo.create(&user, request("A", 10.0, "mild")).await.unwrap();
        repo.create(&user, request("B", 10.0, "mild")).await.unwrap();

        let a_id = a.id.as_ref().unwrap().to_string();
        repo.set_status(&a_id, &user, RecipeStatus::Saved).await.unwrap();

        let saved = repo
            .find_by_user_and_status(&user, RecipeStatus::Saved)
            .await
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "A");
    }
}
