use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::error::ApiError;

/// Longest thumbnail side after the synchronous resize step.
const MAX_DIMENSION: u32 = 1024;

pub struct StoredImage {
    pub filename: String,
    pub url: String,
}

/// Lowercased extension of the client-supplied filename, stripped of
/// anything that is not alphanumeric.
fn file_extension(filename: &str) -> Option<String> {
    let ext: String = filename
        .rsplit_once('.')?
        .1
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    (!ext.is_empty()).then_some(ext)
}

/// Uploaded files never keep their client-supplied name.
fn generate_filename(ext: &str) -> String {
    format!("{}.{}", Uuid::new_v4().simple(), ext)
}

/// Allow-list and size checks; returns the sanitized extension.
fn validate_upload(
    config: &UploadConfig,
    original_name: &str,
    size: usize,
) -> Result<String, ApiError> {
    let ext = file_extension(original_name)
        .ok_or_else(|| ApiError::BadRequest("Invalid file type".into()))?;
    if !config.allowed_extensions.contains(&ext) {
        return Err(ApiError::BadRequest("Invalid file type".into()));
    }
    if size > config.max_bytes {
        return Err(ApiError::BadRequest(format!(
            "File exceeds the {} byte upload limit",
            config.max_bytes
        )));
    }
    Ok(ext)
}

fn resize_and_save(data: &[u8], path: &Path) -> anyhow::Result<()> {
    let img = image::load_from_memory(data).context("decode uploaded image")?;
    let thumb = img.thumbnail(MAX_DIMENSION, MAX_DIMENSION);
    thumb.save(path).context("save resized image")?;
    Ok(())
}

/// Validate, randomize the filename, resize to a thumbnail and persist under
/// the upload directory. Returns the public URL of the stored file.
pub async fn handle_image_upload(
    config: &UploadConfig,
    original_name: &str,
    data: Bytes,
) -> Result<StoredImage, ApiError> {
    let ext = validate_upload(config, original_name, data.len())?;
    let filename = generate_filename(&ext);
    debug!(original = original_name, stored = %filename, "storing upload");

    let dir = PathBuf::from(&config.dir);
    tokio::fs::create_dir_all(&dir)
        .await
        .context("create upload directory")
        .map_err(ApiError::Internal)?;

    let path = dir.join(&filename);
    let result = tokio::task::spawn_blocking(move || resize_and_save(&data, &path))
        .await
        .context("join image task")
        .map_err(ApiError::Internal)?;
    result.map_err(|e| ApiError::BadRequest(format!("Image upload failed: {e}")))?;

    let url = format!("/static/uploads/{filename}");
    info!(%filename, "image uploaded");
    Ok(StoredImage { filename, url })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> UploadConfig {
        UploadConfig {
            dir: "static/uploads".into(),
            max_bytes: 1024,
            allowed_extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
        }
    }

    #[test]
    fn extension_is_lowercased_and_sanitized() {
        assert_eq!(file_extension("photo.PNG"), Some("png".into()));
        assert_eq!(file_extension("../../evil.j!p#g"), Some("jpg".into()));
        assert_eq!(file_extension("noextension"), None);
        assert_eq!(file_extension("trailingdot."), None);
    }

    #[test]
    fn generated_filenames_are_random_and_keep_the_extension() {
        let a = generate_filename("png");
        let b = generate_filename("png");
        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
        // uuid simple form + dot + ext
        assert_eq!(a.len(), 32 + 1 + 3);
    }

    #[test]
    fn disallowed_extension_is_rejected() {
        let err = validate_upload(&config(), "script.exe", 10).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let err = validate_upload(&config(), "big.png", 4096).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn valid_upload_passes_validation() {
        assert_eq!(validate_upload(&config(), "ok.jpeg", 512).unwrap(), "jpeg");
    }
}
