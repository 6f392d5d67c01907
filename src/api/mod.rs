//! HTTP layer: page handlers, the analytics endpoint and routing
//!
//! - Public pages (home, about, services, resources, community, contact)
//! - Admin login/signup and sign-out
//! - Admin pages behind the admin gate
//! - `/api/analytics` JSON endpoint behind the same gate
//! - Embedded static assets

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod common;
pub mod middleware;
pub mod site;
pub mod static_files;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::Uri,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, PageError};

/// Request body ceiling; large enough for an image upload plus form fields
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Admin pages; every route passes the admin gate first
fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::index))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/resources", get(admin::resources))
        .route("/admin/resources/new", get(admin::new_resource).post(admin::create_resource))
        .route("/admin/resources/{id}/edit", get(admin::edit_resource).post(admin::update_resource))
        .route("/admin/resources/{id}/delete", post(admin::delete_resource))
        .route("/admin/resources/{id}/toggle-publish", post(admin::toggle_resource))
        .route("/admin/community", get(admin::community))
        .route("/admin/community/new", get(admin::new_post).post(admin::create_post))
        .route("/admin/posts", get(admin::posts))
        .route("/admin/posts/{id}/edit", get(admin::edit_post).post(admin::update_post))
        .route("/admin/posts/{id}/delete", post(admin::delete_post))
        .route("/admin/posts/{id}/toggle-publish", post(admin::toggle_post))
        .route("/admin/help-requests", get(admin::help_requests))
        .route("/admin/analytics-dashboard", get(admin::analytics_dashboard))
        .route_layer(axum_middleware::from_fn_with_state(state, middleware::require_admin))
}

fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/analytics", get(analytics::summary))
        .route_layer(axum_middleware::from_fn_with_state(state, middleware::require_admin_api))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(site::home))
        .route("/about", get(site::about))
        .route("/services", get(site::services))
        .route("/resources", get(site::resources))
        .route("/resources/{category}", get(site::resource_category))
        .route("/community", get(site::community))
        .route("/community/{id}", get(site::community_post))
        .route("/contact", get(site::contact_page).post(site::contact_submit))
        .route("/admin/login", get(auth::login_page).post(auth::login_submit))
        .route("/admin/signup", get(auth::signup_page).post(auth::signup_submit))
        .route("/admin/signup-success", get(auth::signup_success))
        .route("/auth/signout", post(auth::sign_out))
        .route("/static/{*path}", get(static_files::serve_static))
        .merge(admin_router(state.clone()))
        .merge(api_router(state.clone()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(State(state): State<AppState>, uri: Uri) -> PageError {
    state.not_found(uri.path())
}
