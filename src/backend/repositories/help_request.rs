//! Help request repository (`help_requests` table)

use async_trait::async_trait;
use std::sync::Arc;

use crate::backend::{BackendClient, BackendError, Credential, Query};
use crate::models::{HelpRequest, NewHelpRequest};

pub const TABLE: &str = "help_requests";

#[async_trait]
pub trait HelpRequestRepository: Send + Sync {
    /// Store a submission; visitors may insert but not read back
    async fn create(&self, credential: &Credential, request: &NewHelpRequest) -> Result<(), BackendError>;
    async fn list_all(&self, credential: &Credential) -> Result<Vec<HelpRequest>, BackendError>;
    async fn count(&self, credential: &Credential) -> Result<u64, BackendError>;
}

pub struct RestHelpRequestRepository {
    client: BackendClient,
}

impl RestHelpRequestRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub fn boxed(client: BackendClient) -> Arc<dyn HelpRequestRepository> {
        Arc::new(Self::new(client))
    }
}

#[async_trait]
impl HelpRequestRepository for RestHelpRequestRepository {
    async fn create(&self, credential: &Credential, request: &NewHelpRequest) -> Result<(), BackendError> {
        self.client.insert_only(credential, TABLE, request).await
    }

    async fn list_all(&self, credential: &Credential) -> Result<Vec<HelpRequest>, BackendError> {
        let query = Query::table(TABLE).select("*").order_desc("created_at");
        self.client.select(credential, &query).await
    }

    async fn count(&self, credential: &Credential) -> Result<u64, BackendError> {
        let query = Query::table(TABLE).select("id");
        self.client.count(credential, &query).await
    }
}
