//! Template engine error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThemeError {
    /// Template directory or embedded template missing
    #[error("Template source not found: {0}")]
    NotFound(String),

    /// Template parse or render failure
    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
