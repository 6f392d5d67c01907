//! Auth service client (`/auth/v1`)

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;

use super::{check, decode, BackendClient, BackendError, Credential};
use crate::models::{AuthSession, AuthUser};

/// Account details submitted by the admin signup form
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// Where the confirmation email sends the user
    pub redirect_to: String,
}

/// Auth operations the site relies on
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange email and password for a session
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    /// Register a new account
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), BackendError>;

    /// Trade a refresh token for a new session; refresh tokens are single use
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError>;

    /// Resolve the user behind an access token; `None` when the token is rejected
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError>;

    /// Revoke the session behind an access token
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Serialize)]
struct SignUpMetadata<'a> {
    full_name: &'a str,
}

/// GoTrue-compatible implementation over the shared backend client
pub struct SupabaseAuth {
    client: BackendClient,
}

impl SupabaseAuth {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub fn boxed(client: BackendClient) -> Arc<dyn AuthProvider> {
        Arc::new(Self::new(client))
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let response = self
            .client
            .request(Method::POST, "auth/v1/token", &Credential::Anonymous)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password })
            .send()
            .await?;
        decode(check(response).await?).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let response = self
            .client
            .request(Method::POST, "auth/v1/token", &Credential::Anonymous)
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;
        decode(check(response).await?).await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), BackendError> {
        let response = self
            .client
            .request(Method::POST, "auth/v1/signup", &Credential::Anonymous)
            .query(&[("redirect_to", request.redirect_to.as_str())])
            .json(&SignUpBody {
                email: &request.email,
                password: &request.password,
                data: SignUpMetadata {
                    full_name: &request.full_name,
                },
            })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
        let credential = Credential::User(access_token.to_string());
        let response = self
            .client
            .request(Method::GET, "auth/v1/user", &credential)
            .send()
            .await?;

        match check(response).await {
            Ok(response) => decode(response).await.map(Some),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let credential = Credential::User(access_token.to_string());
        let response = self
            .client
            .request(Method::POST, "auth/v1/logout", &credential)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
