//! Community post repository (`community_feed` table)

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::{BackendClient, BackendError, Credential, Query};
use crate::models::{CommunityPost, NewCommunityPost, PostChanges};

pub const TABLE: &str = "community_feed";

#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// Published posts, newest first, optionally capped at `limit`
    async fn list_published(
        &self,
        credential: &Credential,
        limit: Option<usize>,
    ) -> Result<Vec<CommunityPost>, BackendError>;
    async fn list_all(&self, credential: &Credential) -> Result<Vec<CommunityPost>, BackendError>;
    async fn get_by_id(&self, credential: &Credential, id: Uuid) -> Result<Option<CommunityPost>, BackendError>;
    async fn create(&self, credential: &Credential, post: &NewCommunityPost) -> Result<CommunityPost, BackendError>;
    async fn update(
        &self,
        credential: &Credential,
        id: Uuid,
        changes: &PostChanges,
    ) -> Result<Option<CommunityPost>, BackendError>;
    async fn delete(&self, credential: &Credential, id: Uuid) -> Result<(), BackendError>;
    async fn count(&self, credential: &Credential) -> Result<u64, BackendError>;
}

pub struct RestCommunityRepository {
    client: BackendClient,
}

impl RestCommunityRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub fn boxed(client: BackendClient) -> Arc<dyn CommunityRepository> {
        Arc::new(Self::new(client))
    }
}

#[async_trait]
impl CommunityRepository for RestCommunityRepository {
    async fn list_published(
        &self,
        credential: &Credential,
        limit: Option<usize>,
    ) -> Result<Vec<CommunityPost>, BackendError> {
        let mut query = Query::table(TABLE)
            .select("*")
            .eq("published", true)
            .order_desc("created_at");
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.client.select(credential, &query).await
    }

    async fn list_all(&self, credential: &Credential) -> Result<Vec<CommunityPost>, BackendError> {
        let query = Query::table(TABLE).select("*").order_desc("created_at");
        self.client.select(credential, &query).await
    }

    async fn get_by_id(&self, credential: &Credential, id: Uuid) -> Result<Option<CommunityPost>, BackendError> {
        let query = Query::table(TABLE).select("*").eq("id", id);
        self.client.select_one(credential, &query).await
    }

    async fn create(&self, credential: &Credential, post: &NewCommunityPost) -> Result<CommunityPost, BackendError> {
        self.client.insert(credential, TABLE, post).await
    }

    async fn update(
        &self,
        credential: &Credential,
        id: Uuid,
        changes: &PostChanges,
    ) -> Result<Option<CommunityPost>, BackendError> {
        let query = Query::table(TABLE).eq("id", id);
        let mut rows: Vec<CommunityPost> = self.client.update(credential, &query, changes).await?;
        Ok(rows.pop())
    }

    async fn delete(&self, credential: &Credential, id: Uuid) -> Result<(), BackendError> {
        let query = Query::table(TABLE).eq("id", id);
        self.client.delete(credential, &query).await
    }

    async fn count(&self, credential: &Credential) -> Result<u64, BackendError> {
        let query = Query::table(TABLE).select("id");
        self.client.count(credential, &query).await
    }
}
