//! Admin profile repository (`admin_profiles` table)

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::{BackendClient, BackendError, Credential, Query};
use crate::models::AdminProfile;

pub const TABLE: &str = "admin_profiles";

#[async_trait]
pub trait AdminProfileRepository: Send + Sync {
    /// The profile row for an auth user, when exactly one exists
    async fn get_by_user_id(&self, credential: &Credential, user_id: Uuid) -> Result<Option<AdminProfile>, BackendError>;
}

pub struct RestAdminProfileRepository {
    client: BackendClient,
}

impl RestAdminProfileRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub fn boxed(client: BackendClient) -> Arc<dyn AdminProfileRepository> {
        Arc::new(Self::new(client))
    }
}

#[async_trait]
impl AdminProfileRepository for RestAdminProfileRepository {
    async fn get_by_user_id(&self, credential: &Credential, user_id: Uuid) -> Result<Option<AdminProfile>, BackendError> {
        let query = Query::table(TABLE).select("*").eq("id", user_id);
        self.client.select_one(credential, &query).await
    }
}
