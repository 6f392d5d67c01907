//! Authentication session and admin profile models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the `admin_profiles` table; its presence is what makes a user an admin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl AdminProfile {
    /// Name used when greeting the admin
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref().filter(|e| !e.is_empty()))
            .unwrap_or("Admin")
    }
}

/// User record returned by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued by a successful sign-in
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// Verified admin context attached to requests behind the admin gate
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub user: AuthUser,
    pub profile: AdminProfile,
    pub access_token: String,
}

impl AdminSession {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}
