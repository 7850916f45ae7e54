//! Product API Handlers
//!
//! Catalog reads are open to any authenticated user; writes are
//! admin-only. Create/update are multipart requests carrying a JSON
//! `data` field and an optional image `file` field.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde::Deserialize;

use shared::PaginatedResponse;

use crate::api::upload::{delete_stored_file, store_image};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DiscountParams {
    pub min_discount: Option<f64>,
}

/// Pull the JSON `data` field and optional image `file` field out of a
/// multipart request
async fn read_data_and_file<T: serde::de::DeserializeOwned>(
    multipart: &mut Multipart,
) -> Result<(Option<T>, Option<(Vec<u8>, String)>), AppError> {
    let mut data = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("data") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Multipart error: {}", e)))?;
                data = Some(serde_json::from_slice::<T>(&bytes).map_err(|e| {
                    AppError::validation(format!("Invalid 'data' field: {}", e))
                })?);
            }
            Some("file") => {
                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| AppError::validation("No filename provided in file field"))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Multipart error: {}", e)))?;
                file = Some((bytes.to_vec(), original_name));
            }
            _ => {}
        }
    }

    Ok((data, file))
}

/// GET /api/products - all products
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.get_db());
    let products = repo.find_all().await?;
    Ok(Json(products))
}

/// GET /api/products/paginated?page=&size=
pub async fn list_paginated(
    State(state): State<ServerState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let page = params.page.unwrap_or(1).max(1);
    let size = params.size.unwrap_or(20).clamp(1, 100);

    let repo = ProductRepository::new(state.get_db());
    let (products, total) = repo.find_page(page, size).await?;
    Ok(Json(PaginatedResponse::new(products, page, size, total)))
}

/// GET /api/products/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {}", id)))?;
    Ok(Json(product))
}

/// GET /api/products/category/:category - case-insensitive filter
pub async fn list_by_category(
    State(state): State<ServerState>,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.get_db());
    let products = repo.find_by_category(&category).await?;
    Ok(Json(products))
}

/// GET /api/products/available
pub async fn list_available(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.get_db());
    let products = repo.find_available().await?;
    Ok(Json(products))
}

/// GET /api/products/discounted?min_discount=
pub async fn list_discounted(
    State(state): State<ServerState>,
    Query(params): Query<DiscountParams>,
) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.get_db());
    let products = repo.find_discounted(params.min_discount.unwrap_or(0.0)).await?;
    Ok(Json(products))
}

/// POST /api/products - create a product (admin, multipart)
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<Product>> {
    current_user.ensure_admin()?;

    let (data, file) = read_data_and_file::<ProductCreate>(&mut multipart).await?;
    let data = data.ok_or_else(|| AppError::validation("Missing 'data' field"))?;

    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&data.category, "category", MAX_SHORT_TEXT_LEN)?;

    let image = match file {
        Some((bytes, name)) => Some(store_image(&state, &bytes, &name)?),
        None => None,
    };

    let repo = ProductRepository::new(state.get_db());
    let product = repo.create(data, image).await?;

    tracing::info!(name = %product.name, "Product created");
    Ok(Json(product))
}

/// PUT /api/products/:id - update a product (admin, multipart)
///
/// A new image replaces and deletes the old file.
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<Product>> {
    current_user.ensure_admin()?;

    let (data, file) = read_data_and_file::<ProductUpdate>(&mut multipart).await?;
    let data = data.unwrap_or_default();

    let repo = ProductRepository::new(state.get_db());

    let image = match file {
        Some((bytes, name)) => {
            let existing = repo
                .find_by_id(&id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Product {}", id)))?;
            if let Some(old) = &existing.image {
                delete_stored_file(&state, old);
            }
            Some(store_image(&state, &bytes, &name)?)
        }
        None => None,
    };

    let product = repo.update(&id, data, image).await?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
pub struct StockUpdate {
    pub delta: i32,
}

/// PATCH /api/products/:id/stock - adjust stock by a signed delta (admin)
pub async fn update_stock(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<StockUpdate>,
) -> AppResult<Json<Product>> {
    current_user.ensure_admin()?;

    let repo = ProductRepository::new(state.get_db());
    let product = repo.update_stock(&id, req.delta).await?;
    Ok(Json(product))
}

/// PATCH /api/products/:id/availability - flip availability (admin)
pub async fn toggle_availability(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    current_user.ensure_admin()?;

    let repo = ProductRepository::new(state.get_db());
    let product = repo.toggle_availability(&id).await?;
    Ok(Json(product))
}

/// DELETE /api/products/:id (admin)
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    current_user.ensure_admin()?;

    let repo = ProductRepository::new(state.get_db());
    if let Some(product) = repo.find_by_id(&id).await?
        && let Some(image) = &product.image
    {
        delete_stored_file(&state, image);
    }
    repo.delete(&id).await?;
    Ok(Json(true))
}
