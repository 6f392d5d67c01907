//! HTTP middleware and shared handler types
//!
//! Contains:
//! - Application state shared by all handlers
//! - Error responses for JSON endpoints and HTML pages
//! - The admin gate (session token validation + admin profile check)

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use chrono::Datelike;
use serde::Serialize;
use std::sync::Arc;
use tera::Context as TeraContext;

use crate::api::auth::session_cookies;
use crate::backend::Backends;
use crate::config::{Config, SiteConfig};
use crate::services::{
    AnalyticsService, AuthService, CommunityService, DashboardService, GateState, HelpRequestService,
    ResourceService,
};
use crate::theme::{SiteVars, TemplateEngine};

/// Cookie holding the backend access token
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
/// Cookie holding the backend refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Where unverified visitors of admin pages are sent
pub const LOGIN_PATH: &str = "/admin/login";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub site: Arc<SiteConfig>,
    pub templates: Arc<TemplateEngine>,
    pub auth_service: Arc<AuthService>,
    pub resource_service: Arc<ResourceService>,
    pub community_service: Arc<CommunityService>,
    pub help_request_service: Arc<HelpRequestService>,
    pub dashboard_service: Arc<DashboardService>,
    pub analytics_service: Arc<AnalyticsService>,
}

impl AppState {
    /// Wire every service to the given backend seams
    pub fn new(config: &Config, backends: Backends, templates: TemplateEngine, analytics: AnalyticsService) -> Self {
        let Backends {
            resources,
            posts,
            help_requests,
            profiles,
            auth,
            storage,
        } = backends;

        Self {
            site: Arc::new(config.site.clone()),
            templates: Arc::new(templates),
            auth_service: Arc::new(AuthService::new(auth, profiles, &config.server.public_url)),
            resource_service: Arc::new(ResourceService::new(resources.clone(), storage.clone())),
            community_service: Arc::new(CommunityService::new(posts.clone(), resources.clone(), storage)),
            help_request_service: Arc::new(HelpRequestService::new(
                help_requests.clone(),
                config.site.store_help_requests,
            )),
            dashboard_service: Arc::new(DashboardService::new(resources, posts, help_requests)),
            analytics_service: Arc::new(analytics),
        }
    }

    pub fn site_vars(&self, request_path: &str) -> SiteVars {
        SiteVars {
            site_name: self.site.name.clone(),
            contact_email: self.site.contact_email.clone(),
            measurement_id: self.site.measurement_id.clone(),
            request_path: request_path.to_string(),
            year: chrono::Utc::now().year(),
        }
    }

    /// Render a page template; a template failure becomes a 500 page
    pub fn render(&self, template: &str, context: &TeraContext, request_path: &str) -> Result<Html<String>, PageError> {
        self.templates
            .render_page(template, context, &self.site_vars(request_path))
            .map(Html)
            .map_err(|e| {
                tracing::error!(template, error = %e, "template render failed");
                self.error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong", request_path)
            })
    }

    pub fn error_page(&self, status: StatusCode, message: &str, request_path: &str) -> PageError {
        let html = self
            .templates
            .render_error(status.as_u16(), message, &self.site_vars(request_path));
        PageError { status, html }
    }

    pub fn not_found(&self, request_path: &str) -> PageError {
        self.error_page(StatusCode::NOT_FOUND, "The page you are looking for could not be found.", request_path)
    }
}

/// Rendered HTML error page
#[derive(Debug)]
pub struct PageError {
    pub status: StatusCode,
    pub html: String,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (self.status, Html(self.html)).into_response()
    }
}

/// Error response for JSON endpoints: `{"error": "<message>"}`
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub code: &'static str,
    pub error: String,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            error: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Value of a cookie from the `Cookie` header
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Access token from `Authorization: Bearer` or the access token cookie
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    read_cookie(headers, ACCESS_TOKEN_COOKIE)
}

/// Runs the gate; `None` when denied, otherwise the cookies to re-issue
async fn check_gate(state: &AppState, request: &mut Request) -> Option<HeaderMap> {
    let access_token = extract_access_token(request.headers());
    let refresh_token = read_cookie(request.headers(), REFRESH_TOKEN_COOKIE);
    let check = state
        .auth_service
        .check_session(access_token.as_deref(), refresh_token.as_deref())
        .await;

    match check.state {
        GateState::Verified(session) => {
            request.extensions_mut().insert(session);
            Some(check.renewed.as_ref().map(session_cookies).unwrap_or_default())
        }
        GateState::Unverified => {
            tracing::debug!(path = %request.uri().path(), "admin gate denied request");
            None
        }
    }
}

fn with_cookies(mut response: Response, cookies: &HeaderMap) -> Response {
    for value in cookies.get_all(header::SET_COOKIE) {
        response.headers_mut().append(header::SET_COOKIE, value.clone());
    }
    response
}

/// Admin gate for HTML routes; unverified visitors go to the login page
pub async fn require_admin(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match check_gate(&state, &mut request).await {
        Some(cookies) => with_cookies(next.run(request).await, &cookies),
        None => Redirect::to(LOGIN_PATH).into_response(),
    }
}

/// Admin gate for JSON routes; unverified callers get a 401
pub async fn require_admin_api(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match check_gate(&state, &mut request).await {
        Some(cookies) => Ok(with_cookies(next.run(request).await, &cookies)),
        None => Err(ApiError::unauthorized("Authentication required")),
    }
}
