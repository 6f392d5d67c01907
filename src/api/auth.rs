//! Admin login, signup and sign-out pages
//!
//! A successful login stores the backend tokens in HttpOnly cookies; every
//! later admin request is checked against them by the admin gate.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;

use crate::api::middleware::{
    extract_access_token, AppState, PageError, ACCESS_TOKEN_COOKIE, LOGIN_PATH, REFRESH_TOKEN_COOKIE,
};
use crate::models::AuthSession;
use crate::services::{AuthServiceError, LoginInput, SignupInput};

/// Access token cookie lifetime when the backend does not state one (1 day)
const ACCESS_TOKEN_MAX_AGE: u64 = 24 * 60 * 60;
/// Refresh token cookie lifetime (7 days)
const REFRESH_TOKEN_MAX_AGE: u64 = 7 * 24 * 60 * 60;

const DASHBOARD_PATH: &str = "/admin/dashboard";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SignupForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub confirm_password: String,
}

fn session_cookie(name: &str, value: &str, max_age: u64) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}", name, value, max_age)
}

fn cleared_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}

/// `Set-Cookie` headers for a fresh session
///
/// The access cookie lives as long as the access token; the gate renews it
/// through the refresh cookie.
pub(crate) fn session_cookies(session: &AuthSession) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let access_max_age = session.expires_in.filter(|s| *s > 0).unwrap_or(ACCESS_TOKEN_MAX_AGE);
    let mut cookies = vec![session_cookie(ACCESS_TOKEN_COOKIE, &session.access_token, access_max_age)];
    if let Some(refresh) = session.refresh_token.as_deref() {
        cookies.push(session_cookie(REFRESH_TOKEN_COOKIE, refresh, REFRESH_TOKEN_MAX_AGE));
    }
    for cookie in cookies {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "session token is not a valid cookie value"),
        }
    }
    headers
}

fn clearing_cookies() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
        if let Ok(value) = HeaderValue::from_str(&cleared_cookie(name)) {
            headers.append(header::SET_COOKIE, value);
        }
    }
    headers
}

/// GET /admin/login
pub async fn login_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    render_login(&state, &LoginForm::default(), None)
}

/// POST /admin/login
pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let input = LoginInput {
        email: form.email.clone(),
        password: form.password.clone(),
    };

    match state.auth_service.login(input).await {
        Ok(login) => (session_cookies(&login.session), Redirect::to(DASHBOARD_PATH)).into_response(),
        Err(e) => {
            let message = match &e {
                AuthServiceError::Backend(_) => AuthServiceError::InvalidCredentials.to_string(),
                other => other.to_string(),
            };
            render_login(&state, &form, Some(&message)).into_response()
        }
    }
}

fn render_login(state: &AppState, form: &LoginForm, error: Option<&str>) -> Result<Html<String>, PageError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("error", &error);
    state.render("admin/login.html", &context, LOGIN_PATH)
}

/// GET /admin/signup
pub async fn signup_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    render_signup(&state, &SignupForm::default(), None)
}

/// POST /admin/signup
pub async fn signup_submit(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Response {
    let input = SignupInput {
        full_name: form.full_name.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
        confirm_password: form.confirm_password.clone(),
    };

    match state.auth_service.signup(input).await {
        Ok(()) => Redirect::to("/admin/signup-success").into_response(),
        Err(e) => render_signup(&state, &form, Some(&e.to_string())).into_response(),
    }
}

fn render_signup(state: &AppState, form: &SignupForm, error: Option<&str>) -> Result<Html<String>, PageError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("error", &error);
    state.render("admin/signup.html", &context, "/admin/signup")
}

/// GET /admin/signup-success
pub async fn signup_success(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    state.render("admin/signup_success.html", &TeraContext::new(), "/admin/signup-success")
}

/// POST /auth/signout
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = extract_access_token(&headers) {
        state.auth_service.logout(&token).await;
    }
    (clearing_cookies(), Redirect::to(LOGIN_PATH)).into_response()
}
