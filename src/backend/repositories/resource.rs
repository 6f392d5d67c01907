//! Resource repository (`resources` table)

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::{BackendClient, BackendError, Credential, Query};
use crate::models::{NewResource, Resource, ResourceChanges};

pub const TABLE: &str = "resources";

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Published rows, newest first
    async fn list_published(&self, credential: &Credential) -> Result<Vec<Resource>, BackendError>;
    /// Every row the credential may see, newest first
    async fn list_all(&self, credential: &Credential) -> Result<Vec<Resource>, BackendError>;
    async fn get_by_id(&self, credential: &Credential, id: Uuid) -> Result<Option<Resource>, BackendError>;
    async fn create(&self, credential: &Credential, resource: &NewResource) -> Result<Resource, BackendError>;
    /// Apply changes to one row; `None` when no row matched
    async fn update(
        &self,
        credential: &Credential,
        id: Uuid,
        changes: &ResourceChanges,
    ) -> Result<Option<Resource>, BackendError>;
    async fn delete(&self, credential: &Credential, id: Uuid) -> Result<(), BackendError>;
    async fn count(&self, credential: &Credential) -> Result<u64, BackendError>;
}

pub struct RestResourceRepository {
    client: BackendClient,
}

impl RestResourceRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub fn boxed(client: BackendClient) -> Arc<dyn ResourceRepository> {
        Arc::new(Self::new(client))
    }
}

#[async_trait]
impl ResourceRepository for RestResourceRepository {
    async fn list_published(&self, credential: &Credential) -> Result<Vec<Resource>, BackendError> {
        let query = Query::table(TABLE)
            .select("*")
            .eq("published", true)
            .order_desc("created_at");
        self.client.select(credential, &query).await
    }

    async fn list_all(&self, credential: &Credential) -> Result<Vec<Resource>, BackendError> {
        let query = Query::table(TABLE).select("*").order_desc("created_at");
        self.client.select(credential, &query).await
    }

    async fn get_by_id(&self, credential: &Credential, id: Uuid) -> Result<Option<Resource>, BackendError> {
        let query = Query::table(TABLE).select("*").eq("id", id);
        self.client.select_one(credential, &query).await
    }

    async fn create(&self, credential: &Credential, resource: &NewResource) -> Result<Resource, BackendError> {
        self.client.insert(credential, TABLE, resource).await
    }

    async fn update(
        &self,
        credential: &Credential,
        id: Uuid,
        changes: &ResourceChanges,
    ) -> Result<Option<Resource>, BackendError> {
        let query = Query::table(TABLE).eq("id", id);
        let mut rows: Vec<Resource> = self.client.update(credential, &query, changes).await?;
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
