//! Common request and response helpers shared by page handlers

use axum::response::Redirect;
use serde::Deserialize;

/// `?page=` on the community feed; kept as text so bad values fall back to page 1
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// `?q=` search on the resources page
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// One-shot status messages carried across a redirect
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Redirect to `path` with a success notice
pub fn redirect_with_notice(path: &str, notice: &str) -> Redirect {
    Redirect::to(&format!("{}?notice={}", path, urlencoding::encode(notice)))
}

/// Redirect to `path` with an error message
pub fn redirect_with_error(path: &str, error: &str) -> Redirect {
    Redirect::to(&format!("{}?error={}", path, urlencoding::encode(error)))
}

/// HTML checkboxes are sent as `on` (or any value) when ticked and omitted otherwise
pub fn checkbox(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "false" && v != "off")
}

/// Empty form fields become `None`
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
