//! Analytics passthrough endpoint

use axum::{extract::State, Json};

use crate::api::middleware::{ApiError, AppState};
use crate::services::AnalyticsSummary;

/// GET /api/analytics
///
/// Summary of the configured reporting window. Any upstream failure collapses
/// into a single error object.
pub async fn summary(State(state): State<AppState>) -> Result<Json<AnalyticsSummary>, ApiError> {
    let today = chrono::Utc::now().date_naive();
    state
        .analytics_service
        .summary(today)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal_error(e.to_string()))
}
