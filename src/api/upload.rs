//! Multipart form reading for the admin forms that accept an image
//!
//! Text fields are collected by name; the `image_file` field becomes an
//! [`ImageUpload`] when a file was actually chosen.

use axum::extract::Multipart;
use std::collections::HashMap;

use crate::services::ImageUpload;

/// Name of the file input on the resource and community post forms
pub const IMAGE_FIELD: &str = "image_file";

/// A decoded multipart form
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    pub image: Option<ImageUpload>,
}

impl FormData {
    /// Field value, empty string when absent
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Read every part of a multipart body
pub async fn read_form(mut multipart: Multipart) -> Result<FormData, String> {
    let mut form = FormData::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == IMAGE_FIELD {
            let file_name = field.file_name().map(|s| s.to_string()).unwrap_or_default();
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read file: {}", e))?;

            // Browsers send an empty part when no file was picked
            if !file_name.is_empty() && !data.is_empty() {
                form.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| format!("Failed to read form: {}", e))?;
        form.fields.insert(name, value);
    }

    Ok(form)
}
