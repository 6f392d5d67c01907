//! Configuration management
//!
//! This module handles loading and parsing configuration for the site server.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Managed backend (database, auth, storage) configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Object storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Analytics reporting configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// Site presentation settings
    #[serde(default)]
    pub site: SiteConfig,
    /// Template configuration
    #[serde(default)]
    pub theme: ThemeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public origin of the site, used for auth redirect links
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

/// Managed backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. https://xyz.supabase.co
    #[serde(default)]
    pub url: String,
    /// Public (anon) API key
    #[serde(default)]
    pub anon_key: String,
    /// Service role key, only needed by the storage setup binary
    #[serde(default)]
    pub service_role_key: Option<String>,
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket receiving uploaded post images
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Maximum file size in bytes enforced by the bucket (default: 5MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Image MIME types accepted by the bucket
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_bucket() -> String {
    "community-images".to_string()
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
    ]
}

impl StorageConfig {
    /// Get file extension for a MIME type
    pub fn get_extension(mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "bin",
        }
    }
}

/// Analytics reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// GA4 property identifier (numeric)
    #[serde(default)]
    pub property_id: Option<String>,
    /// Path to a service account JSON key
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    /// Inline service account JSON key (takes precedence over the path)
    #[serde(default)]
    pub credentials_json: Option<String>,
    /// Report window in days, ending today
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    /// Reporting API origin
    #[serde(default = "default_analytics_api_base")]
    pub api_base: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            property_id: None,
            credentials_path: None,
            credentials_json: None,
            lookback_days: default_lookback_days(),
            api_base: default_analytics_api_base(),
        }
    }
}

fn default_lookback_days() -> i64 {
    30
}

fn default_analytics_api_base() -> String {
    "https://analyticsdata.googleapis.com".to_string()
}

impl AnalyticsConfig {
    /// Whether enough is configured to call the reporting API
    pub fn is_configured(&self) -> bool {
        self.property_id.as_deref().is_some_and(|id| !id.is_empty())
            && (self.credentials_json.is_some() || self.credentials_path.is_some())
    }
}

/// Site presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site name shown in titles and emails
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Public contact address
    #[serde(default = "default_contact_email")]
    pub contact_email: String,
    /// Analytics measurement id for the page tag (e.g. G-XXXXXXX)
    #[serde(default)]
    pub measurement_id: Option<String>,
    /// Persist contact form submissions as help requests
    #[serde(default = "default_store_help_requests")]
    pub store_help_requests: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            contact_email: default_contact_email(),
            measurement_id: None,
            store_help_requests: default_store_help_requests(),
        }
    }
}

fn default_site_name() -> String {
    "Olive of Wholeness".to_string()
}

fn default_contact_email() -> String {
    "info@olivesofwholeness.org".to_string()
}

fn default_store_help_requests() -> bool {
    true
}

/// Template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Directory overriding the embedded templates
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - WHOLENESS_SERVER_HOST / _PORT / _PUBLIC_URL
    /// - WHOLENESS_BACKEND_URL / _ANON_KEY / _SERVICE_ROLE_KEY
    /// - WHOLENESS_STORAGE_BUCKET
    /// - WHOLENESS_ANALYTICS_PROPERTY_ID / _CREDENTIALS_PATH / _CREDENTIALS_JSON
    /// - WHOLENESS_SITE_MEASUREMENT_ID / _STORE_HELP_REQUESTS
    /// - WHOLENESS_THEME_PATH
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("WHOLENESS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("WHOLENESS_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(public_url) = std::env::var("WHOLENESS_SERVER_PUBLIC_URL") {
            self.server.public_url = public_url;
        }

        if let Ok(url) = std::env::var("WHOLENESS_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Ok(key) = std::env::var("WHOLENESS_BACKEND_ANON_KEY") {
            self.backend.anon_key = key;
        }
        if let Ok(key) = std::env::var("WHOLENESS_BACKEND_SERVICE_ROLE_KEY") {
            self.backend.service_role_key = Some(key);
        }

        if let Ok(bucket) = std::env::var("WHOLENESS_STORAGE_BUCKET") {
            self.storage.bucket = bucket;
        }

        if let Ok(id) = std::env::var("WHOLENESS_ANALYTICS_PROPERTY_ID") {
            self.analytics.property_id = Some(id);
        }
        if let Ok(path) = std::env::var("WHOLENESS_ANALYTICS_CREDENTIALS_PATH") {
            self.analytics.credentials_path = Some(PathBuf::from(path));
        }
        if let Ok(json) = std::env::var("WHOLENESS_ANALYTICS_CREDENTIALS_JSON") {
            self.analytics.credentials_json = Some(json);
        }

        if let Ok(id) = std::env::var("WHOLENESS_SITE_MEASUREMENT_ID") {
            self.site.measurement_id = Some(id);
        }
        if let Ok(flag) = std::env::var("WHOLENESS_SITE_STORE_HELP_REQUESTS") {
            match flag.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.site.store_help_requests = true,
                "false" | "0" | "no" => self.site.store_help_requests = false,
                _ => {} // Ignore invalid values
            }
        }

        if let Ok(path) = std::env::var("WHOLENESS_THEME_PATH") {
            self.theme.path = Some(PathBuf::from(path));
        }
    }

    /// Check that required settings are present
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.url is required".to_string(),
            ));
        }
        if !self.backend.url.starts_with("http://") && !self.backend.url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "backend.url must be an http(s) URL, got '{}'",
                self.backend.url
            )));
        }
        if self.backend.anon_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.anon_key is required".to_string(),
            ));
        }
        if self.analytics.lookback_days <= 0 {
            return Err(ConfigError::ValidationError(
                "analytics.lookback_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
