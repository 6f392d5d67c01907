//! In-memory backend used by tests
//!
//! Every fake counts its calls so tests can prove that validation rejected a
//! request before anything reached the backend.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::auth::{AuthProvider, SignUpRequest};
use super::repositories::{AdminProfileRepository, CommunityRepository, HelpRequestRepository, ResourceRepository};
use super::storage::ObjectStorage;
use super::{BackendError, Credential};
use crate::models::{
    AdminProfile, AuthSession, AuthUser, CommunityPost, HelpRequest, NewCommunityPost, NewHelpRequest, NewResource,
    PostChanges, Resource, ResourceChanges,
};

/// Shared failure switch and call counter
#[derive(Default)]
pub struct Probe {
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl Probe {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following call fail with `message`
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    fn enter(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(BackendError::Api { status: 400, message }),
            None => Ok(()),
        }
    }
}

/// A fixed point in time plus `minutes`
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn sample_resource(title: &str, category: &str, published: bool, created_at: DateTime<Utc>) -> Resource {
    Resource {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: format!("{} content", title),
        excerpt: None,
        category: category.to_string(),
        created_at,
        image_url: None,
        resource_url: None,
        published,
        author_id: None,
    }
}

pub fn sample_post(title: &str, published: bool, created_at: DateTime<Utc>) -> CommunityPost {
    CommunityPost {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: format!("{} content", title),
        image_url: None,
        link_url: None,
        published,
        author_id: None,
        created_at,
    }
}

fn newest_first<T>(rows: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
}

#[derive(Default)]
pub struct MemoryResources {
    pub rows: Mutex<Vec<Resource>>,
    pub probe: Probe,
    /// Return drafts from `list_published` as a misconfigured backend would
    pub ignore_published_filter: AtomicBool,
}

impl MemoryResources {
    pub fn with(rows: Vec<Resource>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            ..Default::default()
        })
    }

    pub fn snapshot(&self) -> Vec<Resource> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceRepository for MemoryResources {
    async fn list_published(&self, _credential: &Credential) -> Result<Vec<Resource>, BackendError> {
        self.probe.enter()?;
        let leak = self.ignore_published_filter.load(Ordering::SeqCst);
        let mut rows: Vec<Resource> = self
            .snapshot()
            .into_iter()
            .filter(|r| leak || r.published)
            .collect();
        newest_first(&mut rows, |r| r.created_at);
        Ok(rows)
    }

    async fn list_all(&self, _credential: &Credential) -> Result<Vec<Resource>, BackendError> {
        self.probe.enter()?;
        let mut rows = self.snapshot();
        newest_first(&mut rows, |r| r.created_at);
        Ok(rows)
    }

    async fn get_by_id(&self, _credential: &Credential, id: Uuid) -> Result<Option<Resource>, BackendError> {
        self.probe.enter()?;
        Ok(self.snapshot().into_iter().find(|r| r.id == id))
    }

    async fn create(&self, _credential: &Credential, resource: &NewResource) -> Result<Resource, BackendError> {
        self.probe.enter()?;
        let row = Resource {
            id: Uuid::new_v4(),
            title: resource.title.clone(),
            content: resource.content.clone(),
            excerpt: Some(resource.excerpt.clone()),
            category: resource.category.clone(),
            created_at: Utc::now(),
            image_url: resource.image_url.clone(),
            resource_url: resource.resource_url.clone(),
            published: resource.published,
            author_id: Some(resource.author_id),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        _credential: &Credential,
        id: Uuid,
        changes: &ResourceChanges,
    ) -> Result<Option<Resource>, BackendError> {
        self.probe.enter()?;
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|r| r.id == id).map(|row| {
            changes.apply_to(row);
            row.clone()
        }))
    }

    async fn delete(&self, _credential: &Credential, id: Uuid) -> Result<(), BackendError> {
        self.probe.enter()?;
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn count(&self, _credential: &Credential) -> Result<u64, BackendError> {
        self.probe.enter()?;
        Ok(self.rows.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct MemoryPosts {
    pub rows: Mutex<Vec<CommunityPost>>,
    pub probe: Probe,
    pub ignore_published_filter: AtomicBool,
}

impl MemoryPosts {
    pub fn with(rows: Vec<CommunityPost>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            ..Default::default()
        })
    }

    pub fn snapshot(&self) -> Vec<CommunityPost> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommunityRepository for MemoryPosts {
    async fn list_published(
        &self,
        _credential: &Credential,
        limit: Option<usize>,
    ) -> Result<Vec<CommunityPost>, BackendError> {
        self.probe.enter()?;
        let leak = self.ignore_published_filter.load(Ordering::SeqCst);
        let mut rows: Vec<CommunityPost> = self
            .snapshot()
            .into_iter()
            .filter(|p| leak || p.published)
            .collect();
        newest_first(&mut rows, |p| p.created_at);
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn list_all(&self, _credential: &Credential) -> Result<Vec<CommunityPost>, BackendError> {
        self.probe.enter()?;
        let mut rows = self.snapshot();
        newest_first(&mut rows, |p| p.created_at);
        Ok(rows)
    }

    async fn get_by_id(&self, _credential: &Credential, id: Uuid) -> Result<Option<CommunityPost>, BackendError> {
        self.probe.enter()?;
        Ok(self.snapshot().into_iter().find(|p| p.id == id))
    }

    async fn create(&self, _credential: &Credential, post: &NewCommunityPost) -> Result<CommunityPost, BackendError> {
        self.probe.enter()?;
        let row = CommunityPost {
            id: Uuid::new_v4(),
            title: post.title.clone(),
            content: post.content.clone(),
            image_url: post.image_url.clone(),
            link_url: post.link_url.clone(),
            published: post.published,
            author_id: Some(post.author_id),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        _credential: &Credential,
        id: Uuid,
        changes: &PostChanges,
    ) -> Result<Option<CommunityPost>, BackendError> {
        self.probe.enter()?;
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|p| p.id == id).map(|row| {
            changes.apply_to(row);
            row.clone()
        }))
    }

    async fn delete(&self, _credential: &Credential, id: Uuid) -> Result<(), BackendError> {
        self.probe.enter()?;
        self.rows.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn count(&self, _credential: &Credential) -> Result<u64, BackendError> {
        self.probe.enter()?;
        Ok(self.rows.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct MemoryHelpRequests {
    pub rows: Mutex<Vec<HelpRequest>>,
    pub probe: Probe,
    pub last_credential: Mutex<Option<Credential>>,
}

impl MemoryHelpRequests {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> Vec<HelpRequest> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl HelpRequestRepository for MemoryHelpRequests {
    async fn create(&self, credential: &Credential, request: &NewHelpRequest) -> Result<(), BackendError> {
        self.probe.enter()?;
        *self.last_credential.lock().unwrap() = Some(credential.clone());
        self.rows.lock().unwrap().push(HelpRequest {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            email: request.email.clone(),
            message: request.message.clone(),
            consent_given: request.consent_given,
            status: request.status,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_all(&self, _credential: &Credential) -> Result<Vec<HelpRequest>, BackendError> {
        self.probe.enter()?;
        let mut rows = self.snapshot();
        newest_first(&mut rows, |r| r.created_at);
        Ok(rows)
    }

    async fn count(&self, _credential: &Credential) -> Result<u64, BackendError> {
        self.probe.enter()?;
        Ok(self.rows.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct MemoryProfiles {
    pub rows: Mutex<HashMap<Uuid, AdminProfile>>,
    pub probe: Probe,
}

impl MemoryProfiles {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, profile: AdminProfile) {
        self.rows.lock().unwrap().insert(profile.id, profile);
    }
}

#[async_trait]
impl AdminProfileRepository for MemoryProfiles {
    async fn get_by_user_id(&self, _credential: &Credential, user_id: Uuid) -> Result<Option<AdminProfile>, BackendError> {
        self.probe.enter()?;
        Ok(self.rows.lock().unwrap().get(&user_id).cloned())
    }
}

struct Account {
    password: String,
    user: AuthUser,
    token: String,
}

/// Auth service holding accounts and issued tokens in memory
#[derive(Default)]
pub struct FakeAuth {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, AuthUser>>,
    refresh_tokens: Mutex<HashMap<String, AuthUser>>,
    pub sign_ups: Mutex<Vec<SignUpRequest>>,
    pub signed_out: Mutex<Vec<String>>,
    pub probe: Probe,
}

impl FakeAuth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register an account whose sign-in yields `token`; returns the user
    pub fn add_account(&self, email: &str, password: &str, token: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
                token: token.to_string(),
            },
        );
        self.tokens.lock().unwrap().insert(token.to_string(), user.clone());
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(format!("refresh-{}", token), user.clone());
        user
    }

    /// Stop accepting an access token, as when it runs past its expiry
    pub fn expire(&self, access_token: &str) {
        self.tokens.lock().unwrap().remove(access_token);
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        self.probe.enter()?;
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email) {
            Some(account) if account.password == password => {
                self.tokens
                    .lock()
                    .unwrap()
                    .insert(account.token.clone(), account.user.clone());
                self.refresh_tokens
                    .lock()
                    .unwrap()
                    .insert(format!("refresh-{}", account.token), account.user.clone());
                Ok(AuthSession {
                    access_token: account.token.clone(),
                    refresh_token: Some(format!("refresh-{}", account.token)),
                    expires_in: Some(3600),
                    user: account.user.clone(),
                })
            }
            _ => Err(BackendError::Api {
                status: 400,
                message: "Invalid login credentials".to_string(),
            }),
        }
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), BackendError> {
        self.probe.enter()?;
        self.sign_ups.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        self.probe.enter()?;
        let user = self.refresh_tokens.lock().unwrap().remove(refresh_token).ok_or(BackendError::Api {
            status: 400,
            message: "Invalid Refresh Token: Refresh Token Not Found".to_string(),
        })?;
        let access_token = format!("renewed-{}", refresh_token);
        self.tokens.lock().unwrap().insert(access_token.clone(), user.clone());
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(format!("refresh-{}", access_token), user.clone());
        Ok(AuthSession {
            refresh_token: Some(format!("refresh-{}", access_token)),
            access_token,
            expires_in: Some(3600),
            user,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
        self.probe.enter()?;
        Ok(self.tokens.lock().unwrap().get(access_token).cloned())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        self.probe.enter()?;
        self.tokens.lock().unwrap().remove(access_token);
        self.signed_out.lock().unwrap().push(access_token.to_string());
        Ok(())
    }
}

/// Upload record kept by [`FakeStorage`]
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub path: String,
    pub size: usize,
    pub content_type: String,
}

#[derive(Default)]
pub struct FakeStorage {
    pub objects: Mutex<Vec<StoredObject>>,
    pub probe: Probe,
}

impl FakeStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(
        &self,
        _credential: &Credential,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        self.probe.enter()?;
        self.objects.lock().unwrap().push(StoredObject {
            path: path.to_string(),
            size: data.len(),
            content_type: content_type.to_string(),
        });
        Ok(format!("https://storage.test/community-images/{}", path))
    }
}
