//! Image Upload Handlers
//!
//! Accepts image uploads from authenticated users, stores them under
//! the work directory and serves them back as `/uploads/<name>`.

use axum::Json;
use axum::extract::{Multipart, Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Maximum file size (5MB)
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Supported image formats
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    pub url: String,
}

/// Keep only filesystem-safe characters from a client filename
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Validate an uploaded image: size cap, extension whitelist and an
/// actual decode of the bytes
fn validate_image(data: &[u8], ext: &str) -> Result<(), AppError> {
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::validation(format!(
            "File too large. Maximum size is {}MB",
            MAX_FILE_SIZE / 1024 / 1024
        )));
    }

    let ext_lower = ext.to_lowercase();
    if !SUPPORTED_FORMATS.contains(&ext_lower.as_str()) {
        return Err(AppError::validation(format!(
            "Unsupported file format '{}'. Supported: {}",
            ext_lower,
            SUPPORTED_FORMATS.join(", ")
        )));
    }

    if let Err(e) = image::load_from_memory(data) {
        return Err(AppError::validation(format!(
            "Invalid image file ({}): {}",
            ext_lower, e
        )));
    }

    Ok(())
}

/// Store validated image bytes, returning the public `/uploads/...` URL
pub fn store_image(
    state: &ServerState,
    data: &[u8],
    original_name: &str,
) -> Result<String, AppError> {
    let ext = PathBuf::from(original_name)
        .extension()
        .and_then(|ext| ext.to_str().map(|s| s.to_string()))
        .ok_or_else(|| {
            AppError::validation(format!("Invalid file extension for: {}", original_name))
        })?;

    validate_image(data, &ext)?;

    let uploads_dir = state.config.uploads_dir();
    fs::create_dir_all(&uploads_dir)
        .map_err(|e| AppError::internal(format!("Failed to create uploads directory: {}", e)))?;

    let stored_name = format!("{}_{}", Uuid::new_v4(), sanitize_filename(original_name));
    let file_path = uploads_dir.join(&stored_name);

    fs::write(&file_path, data)
        .map_err(|e| AppError::internal(format!("Failed to save file: {}", e)))?;

    tracing::info!(
        original_name = %original_name,
        stored_name = %stored_name,
        size = data.len(),
        "Image uploaded"
    );

    Ok(format!("/uploads/{}", stored_name))
}

/// Delete a previously stored file by its `/uploads/...` URL; missing
/// files are ignored
pub fn delete_stored_file(state: &ServerState, url: &str) {
    let Some(filename) = url.strip_prefix("/uploads/") else {
        return;
    };
    // Refuse anything trying to walk out of the uploads directory
    if filename.contains("..") || filename.contains('/') {
        return;
    }
    let path = state.config.uploads_dir().join(filename);
    if let Err(e) = fs::remove_file(&path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(file = %filename, error = %e, "Failed to delete stored file");
    }
}

/// Read the `file` field out of a multipart request
pub(crate) async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<Option<(Vec<u8>, String)>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|s| s.to_string());
        if name.as_deref() == Some("file") {
            let original_name = field
                .file_name()
                .map(|s| s.to_string())
                .ok_or_else(|| AppError::validation("No filename provided in file field"))?;
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(format!("Multipart error: {}", e)))?
                .to_vec();
            return Ok(Some((data, original_name)));
        }
    }
    Ok(None)
}

/// POST /api/upload - store an image
pub async fn upload(
    State(state): State<ServerState>,
    _current_user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let (data, original_name) = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::validation("No 'file' field found. Field name must be 'file'"))?;

    if data.is_empty() {
        return Err(AppError::validation("Empty file provided"));
    }

    let url = store_image(&state, &data, &original_name)?;
    let filename = url.trim_start_matches("/uploads/").to_string();

    Ok(Json(UploadResponse {
        filename,
        original_name,
        size: data.len(),
        url,
    }))
}

/// GET /uploads/:filename - serve a stored image
pub async fn serve(
    State(state): State<ServerState>,
    AxumPath(filename): AxumPath<String>,
) -> Response {
    if filename.contains("..") || filename.contains('/') {
        return (StatusCode::BAD_REQUEST, "invalid filename").into_response();
    }

    let path = state.config.uploads_dir().join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();
            ([(http::header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtService;
    use crate::core::Config;
    use std::io::Cursor;
    use std::sync::Arc;
    use surrealdb::Surreal;
    use surrealdb::engine::local::Mem;

    async fn test_state(work_dir: &std::path::Path) -> ServerState {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        let config = Config::with_overrides(work_dir.to_string_lossy().to_string(), 0);
        ServerState::new(config, db, Arc::new(JwtService::default()))
    }

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::new(2, 2);
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("achar photo (1).png"), "achar_photo__1_.png");
        assert_eq!(sanitize_filename("ok-name_2.jpg"), "ok-name_2.jpg");
    }

    #[tokio::test]
    async fn test_store_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        let url = store_image(&state, &tiny_png(), "mango.png").unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with("_mango.png"));

        let stored = state
            .config
            .uploads_dir()
            .join(url.trim_start_matches("/uploads/"));
        assert!(stored.exists());

        delete_stored_file(&state, &url);
        assert!(!stored.exists());
    }

    #[tokio::test]
    async fn test_non_image_bytes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        assert!(store_image(&state, b"definitely not an image", "evil.png").is_err());
        assert!(store_image(&state, &tiny_png(), "script.sh").is_err());
    }

    #[tokio::test]
    async fn test_path_traversal_urls_are_ignored_on_delete() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        // Nothing to assert beyond "does not panic / does not escape";
        // the guard refuses the path outright
        delete_stored_file(&state, "/uploads/../market.db");
        delete_stored_file(&state, "/etc/passwd");
    }
}
