use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::warn;
use uuid::Uuid;

/// Directory (under MEDIA_ROOT) recipe images are stored in
pub const RECIPE_IMAGE_DIR: &str = "recipes/images";

#[derive(Debug, PartialEq)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Decode a `data:image/<ext>;base64,<payload>` string
pub fn decode_data_uri(data: &str) -> Result<DecodedImage, String> {
    let (header, payload) = data
        .split_once(";base64,")
        .ok_or("Image must be a base64 data URI.")?;

    let extension = header
        .strip_prefix("data:image/")
        .ok_or("Image must be a base64 data URI.")?
        .to_ascii_lowercase();

    if extension.is_empty()
        || extension.len() > 10
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(format!("Unsupported image format: {}", extension));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("Invalid base64 image: {}", e))?;

    if bytes.is_empty() {
        return Err("The submitted image is empty.".to_string());
    }

    Ok(DecodedImage { extension, bytes })
}

impl DecodedImage {
    /// Write the image under a fresh name and return its path relative to `media_root`
    pub async fn store(&self, media_root: &Path) -> std::io::Result<String> {
        let dir = media_root.join(RECIPE_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), self.extension);
        tokio::fs::write(dir.join(&file_name), &self.bytes).await?;

        Ok(format!("{}/{}", RECIPE_IMAGE_DIR, file_name))
    }
}

/// Best-effort removal of a stored image; failures are logged, not returned
pub async fn remove(media_root: &Path, path: &str) {
    if let Err(e) = tokio::fs::remove_file(media_root.join(path)).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path, error = %e, "failed to remove stored image");
        }
    }
}
