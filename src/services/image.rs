//! Image source handling for admin forms
//!
//! A post or resource image comes either from an uploaded file (stored in the
//! image bucket) or from a URL typed into the form, never both.

use chrono::Utc;
use uuid::Uuid;

use crate::backend::{BackendError, Credential, ObjectStorage};
use crate::config::StorageConfig;

/// A file received from a multipart form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Raw image fields of a submitted form
#[derive(Debug, Clone, Default)]
pub struct ImageInput {
    pub upload: Option<ImageUpload>,
    pub url: Option<String>,
}

/// The image source the admin picked
#[derive(Debug, Clone)]
pub enum ImageChoice {
    None,
    Upload(ImageUpload),
    Url(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Choose either upload a file or provide an image URL, not both.")]
    BothSources,
}

impl ImageInput {
    /// Decide which source to use; empty fields count as absent
    pub fn resolve(self) -> Result<ImageChoice, ImageError> {
        let upload = self.upload.filter(|u| !u.data.is_empty());
        let url = self
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        match (upload, url) {
            (Some(_), Some(_)) => Err(ImageError::BothSources),
            (Some(upload), None) => Ok(ImageChoice::Upload(upload)),
            (None, Some(url)) => Ok(ImageChoice::Url(url)),
            (None, None) => Ok(ImageChoice::None),
        }
    }
}

/// Object name for an upload: `<unix-millis>-<random>.<ext>`
pub fn object_name(upload: &ImageUpload) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}-{}.{}", Utc::now().timestamp_millis(), &random[..12], extension(upload))
}

/// Extension from the uploaded file name, falling back to the MIME type
fn extension(upload: &ImageUpload) -> String {
    upload
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| StorageConfig::get_extension(&upload.content_type).to_string())
}

/// Store the chosen image and return the URL to save on the row
pub async fn store_image(
    storage: &dyn ObjectStorage,
    credential: &Credential,
    choice: ImageChoice,
) -> Result<Option<String>, BackendError> {
    match choice {
        ImageChoice::None => Ok(None),
        ImageChoice::Url(url) => Ok(Some(url)),
        ImageChoice::Upload(upload) => {
            let path = object_name(&upload);
            let url = storage
                .upload(credential, &path, upload.data, &upload.content_type)
                .await?;
            tracing::info!(path = %path, "image uploaded");
            Ok(Some(url))
        }
    }
}
