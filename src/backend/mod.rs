//! Managed backend access
//!
//! Every read and write of site content goes through the hosted backend's
//! REST surface:
//! - `/rest/v1` table access (repositories)
//! - `/auth/v1` sign-in, sign-up, user lookup, sign-out
//! - `/storage/v1` object uploads
//!
//! Row-level security is enforced by the backend, so each call carries an
//! explicit [`Credential`]: the anon key for public reads, or the signed-in
//! admin's access token.

pub mod auth;
pub mod repositories;
pub mod rest;
pub mod storage;

#[cfg(test)]
pub mod memory;

use anyhow::Context;
use reqwest::{header, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BackendConfig, Config};
use crate::models::AdminSession;
use repositories::{
    AdminProfileRepository, CommunityRepository, HelpRequestRepository, ResourceRepository,
    RestAdminProfileRepository, RestCommunityRepository, RestHelpRequestRepository, RestResourceRepository,
};

pub use auth::{AuthProvider, SignUpRequest, SupabaseAuth};
pub use rest::Query;
pub use storage::{BucketSpec, ObjectStorage, SupabaseStorage};

/// Upstream request timeout
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Identity a backend call is made with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Public visitor, authorized by the anon key
    Anonymous,
    /// Signed-in user, authorized by their access token
    User(String),
}

impl Credential {
    /// Bearer token to send for this credential
    pub fn token<'a>(&'a self, anon_key: &'a str) -> &'a str {
        match self {
            Self::Anonymous => anon_key,
            Self::User(token) => token,
        }
    }
}

impl From<&AdminSession> for Credential {
    fn from(session: &AdminSession) -> Self {
        Self::User(session.access_token.clone())
    }
}

/// Errors from the managed backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Network or protocol failure
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with an error status; `message` is its own text
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The backend answered with something we could not interpret
    #[error("Unexpected response from backend: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) => None,
        }
    }

    /// Whether the backend rejected the credential
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

/// Shared HTTP client bound to one backend project
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create backend HTTP client")?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Absolute URL for a path relative to the project URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request with the project key and the credential's bearer token
    pub(crate) fn request(&self, method: Method, path: &str, credential: &Credential) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(credential.token(&self.anon_key))
    }

    /// Request authorized by an explicit key (e.g. the service role key)
    pub(crate) fn request_with_key(&self, method: Method, path: &str, key: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", key)
            .bearer_auth(key)
    }

    /// Fetch all rows matching `query`
    pub async fn select<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        query: &Query,
    ) -> Result<Vec<T>, BackendError> {
        tracing::debug!(table = query.table_name(), query = %query.to_query_string(), "select");
        let response = self
            .request(Method::GET, &query.path(), credential)
            .query(query.params())
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Fetch the row matching `query` when exactly one does
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        query: &Query,
    ) -> Result<Option<T>, BackendError> {
        let mut rows: Vec<T> = self.select(credential, query).await?;
        if rows.len() == 1 {
            Ok(rows.pop())
        } else {
            Ok(None)
        }
    }

    /// Exact row count for `query`, read from `Content-Range`
    pub async fn count(&self, credential: &Credential, query: &Query) -> Result<u64, BackendError> {
        let response = self
            .request(Method::HEAD, &query.path(), credential)
            .query(query.params())
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check(response).await?;

        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(rest::parse_content_range)
            .ok_or_else(|| BackendError::Decode(format!("missing row count for {}", query.table_name())))
    }

    /// Insert one row into `table` and return it as stored
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        credential: &Credential,
        table: &str,
        row: &B,
    ) -> Result<T, BackendError> {
        let query = Query::table(table);
        let response = self
            .request(Method::POST, &query.path(), credential)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let mut rows: Vec<T> = decode(check(response).await?).await?;
        if rows.is_empty() {
            return Err(BackendError::Decode(format!("insert into {} returned no row", table)));
        }
        Ok(rows.remove(0))
    }

    /// Insert one row without reading it back (for tables the caller cannot select)
    pub async fn insert_only<B: Serialize + ?Sized>(
        &self,
        credential: &Credential,
        table: &str,
        row: &B,
    ) -> Result<(), BackendError> {
        let query = Query::table(table);
        let response = self
            .request(Method::POST, &query.path(), credential)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Apply `changes` to the rows matching `query`, returning the updated rows
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        credential: &Credential,
        query: &Query,
        changes: &B,
    ) -> Result<Vec<T>, BackendError> {
        let response = self
            .request(Method::PATCH, &query.path(), credential)
            .query(query.params())
            .header("Prefer", "return=representation")
            .json(changes)
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Delete the rows matching `query`
    pub async fn delete(&self, credential: &Credential, query: &Query) -> Result<(), BackendError> {
        let response = self
            .request(Method::DELETE, &query.path(), credential)
            .query(query.params())
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

/// Every backend seam the services depend on
#[derive(Clone)]
pub struct Backends {
    pub resources: Arc<dyn ResourceRepository>,
    pub posts: Arc<dyn CommunityRepository>,
    pub help_requests: Arc<dyn HelpRequestRepository>,
    pub profiles: Arc<dyn AdminProfileRepository>,
    pub auth: Arc<dyn AuthProvider>,
    pub storage: Arc<dyn ObjectStorage>,
}

impl Backends {
    /// REST implementations sharing one client
    pub fn connect(config: &Config) -> anyhow::Result<Self> {
        let client = BackendClient::new(&config.backend)?;
        Ok(Self {
            resources: RestResourceRepository::boxed(client.clone()),
            posts: RestCommunityRepository::boxed(client.clone()),
            help_requests: RestHelpRequestRepository::boxed(client.clone()),
            profiles: RestAdminProfileRepository::boxed(client.clone()),
            auth: SupabaseAuth::boxed(client.clone()),
            storage: SupabaseStorage::boxed(client, config.storage.bucket.clone()),
        })
    }
}

/// Turn an error status into [`BackendError::Api`] carrying the upstream message
pub(crate) async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = rest::extract_message(status.as_u16(), &body);
    tracing::warn!(status = status.as_u16(), %message, "backend request failed");
    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Deserialize a JSON body
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}
