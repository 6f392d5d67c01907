//! PostgREST query building and response helpers

use std::fmt::Display;

/// A table query expressed as PostgREST URL parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    params: Vec<(String, String)>,
}

impl Query {
    /// Start a query against `table`
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            params: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    /// Equality filter (`column=eq.value`)
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.params.push(("order".to_string(), format!("{}.desc", column)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Path of the table endpoint relative to the project URL
    pub fn path(&self) -> String {
        format!("rest/v1/{}", self.table)
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Encoded query string, used for logging
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Total row count from a `Content-Range` header (`0-9/42`, `*/0`)
pub fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

/// Human-readable error message from an upstream error body
///
/// PostgREST uses `message`, the auth service `msg` or `error_description`,
/// and storage `message` or `error`. Falls back to the raw body, then the
/// status reason.
pub fn extract_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}
