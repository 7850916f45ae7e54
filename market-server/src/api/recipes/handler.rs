//! Custom Recipe API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    CustomRecipe, CustomRecipeRequest, RecipePriceCalculationRequest, RecipeStatus,
};
use crate::db::repository::{RecipeRepository, parse_record_id_for};
use crate::pricing::{RecipePriceBreakdown, calculate_recipe_price};
use crate::utils::AppResult;

fn repo(state: &ServerState) -> RecipeRepository {
    RecipeRepository::new(state.get_db())
}

fn caller_id(user: &CurrentUser) -> AppResult<surrealdb::RecordId> {
    Ok(parse_record_id_for("user", &user.id)?)
}

/// POST /api/recipes - create a draft recipe
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(req): Json<CustomRecipeRequest>,
) -> AppResult<Json<CustomRecipe>> {
    let user = caller_id(&current_user)?;
    let recipe = repo(&state).create(&user, req).await?;
    Ok(Json(recipe))
}

/// POST /api/recipes/calculate-price - pure calculation, nothing stored
pub async fn calculate_price(
    Json(req): Json<RecipePriceCalculationRequest>,
) -> Json<RecipePriceBreakdown> {
    Json(calculate_recipe_price(
        req.base_price,
        &req.ingredients,
        req.oil_type.as_deref(),
        req.spice_level.as_deref(),
    ))
}

/// GET /api/recipes - all of the caller's recipes
pub async fn my_recipes(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<CustomRecipe>>> {
    let user = caller_id(&current_user)?;
    let recipes = repo(&state).find_by_user(&user).await?;
    Ok(Json(recipes))
}

/// GET /api/recipes/saved - the caller's SAVED recipes
pub async fn my_saved_recipes(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<CustomRecipe>>> {
    let user = caller_id(&current_user)?;
    let recipes = repo(&state)
        .find_by_user_and_status(&user, RecipeStatus::Saved)
        .await?;
    Ok(Json(recipes))
}

/// GET /api/recipes/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<CustomRecipe>> {
    let recipe = repo(&state)
        .find_by_id(&id)
        .await?
        .ok_or_else(|| crate::utils::AppError::not_found(format!("Recipe {}", id)))?;
    Ok(Json(recipe))
}

/// GET /api/recipes/share/:token - public read-only access
pub async fn get_by_share_token(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> AppResult<Json<CustomRecipe>> {
    let recipe = repo(&state).find_by_share_token(&token).await?;
    Ok(Json(recipe))
}

/// PUT /api/recipes/:id - owner-only update with price recomputation
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CustomRecipeRequest>,
) -> AppResult<Json<CustomRecipe>> {
    let user = caller_id(&current_user)?;
    let recipe = repo(&state).update(&id, &user, req).await?;
    Ok(Json(recipe))
}

/// PUT /api/recipes/:id/save - DRAFT → SAVED
pub async fn save(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<CustomRecipe>> {
    let user = caller_id(&current_user)?;
    let recipe = repo(&state)
        .set_status(&id, &user, RecipeStatus::Saved)
        .await?;
    Ok(Json(recipe))
}

/// PUT /api/recipes/:id/share - mark SHARED (the token itself exists
/// from creation)
pub async fn share(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<CustomRecipe>> {
    let user = caller_id(&current_user)?;
    let recipe = repo(&state)
        .set_status(&id, &user, RecipeStatus::Shared)
        .await?;
    Ok(Json(recipe))
}

/// DELETE /api/recipes/:id - owner-only
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let user = caller_id(&current_user)?;
    repo(&state).delete(&id, &user).await?;
    Ok(Json(true))
}
