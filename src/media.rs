//! Uploaded image validation and storage under the media root.

use std::{io::ErrorKind, path::Path};

use image::ImageFormat;
use log::{debug, warn};
use uuid::Uuid;

use crate::{
    error::ApiError, IMAGE_FIELD, MSG_EMPTY_FILE, MSG_INVALID_IMAGE, RECIPE_IMAGE_DIR,
};

/// Accepts only bytes that fully decode as a supported image format.
pub fn validate_image(bytes: &[u8]) -> Result<ImageFormat, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::field(IMAGE_FIELD, MSG_EMPTY_FILE));
    }

    let invalid = |_e: image::ImageError| ApiError::field(IMAGE_FIELD, MSG_INVALID_IMAGE);
    let format = image::guess_format(bytes).map_err(invalid)?;
    image::load_from_memory_with_format(bytes, format).map_err(invalid)?;

    Ok(format)
}

fn extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("img")
}

/// Writes a recipe image under a fresh name and returns its path relative
/// to `root`.
pub async fn save_recipe_image(
    root: &Path,
    bytes: &[u8],
    format: ImageFormat,
) -> Result<String, ApiError> {
    let relative = format!("{RECIPE_IMAGE_DIR}/{}.{}", Uuid::new_v4(), extension(format));
    let path = root.join(&relative);

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to create {}: {e}", dir.display())))?;
    }

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to write {}: {e}", path.display())))?;

    debug!("Stored {} bytes at {}", bytes.len(), path.display());
    Ok(relative)
}

/// Best-effort removal of a stored file. Failures are logged, never raised.
pub async fn remove_media(root: &Path, relative: &str) {
    let path = root.join(relative);

    match tokio::fs::remove_file(&path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {e}", path.display()),
    }
}

/// Public URL of a stored file.
pub fn media_url(base: &str, relative: &str) -> String {
    format!("{base}{relative}")
}
