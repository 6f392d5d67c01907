//! Help request model (contact form submissions)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Help request status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelpRequestStatus {
    #[default]
    New,
    Reviewed,
    Responded,
}

impl std::fmt::Display for HelpRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Reviewed => write!(f, "reviewed"),
            Self::Responded => write!(f, "responded"),
        }
    }
}

impl std::str::FromStr for HelpRequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "reviewed" => Ok(Self::Reviewed),
            "responded" => Ok(Self::Responded),
            _ => Err(anyhow::anyhow!("Invalid help request status: {}", s)),
        }
    }
}

/// A row of the `help_requests` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub consent_given: bool,
    #[serde(default)]
    pub status: HelpRequestStatus,
    pub created_at: DateTime<Utc>,
}

impl HelpRequest {
    /// First eight characters of the id, for display
    pub fn short_id(&self) -> String {
        self.id.to_string().chars().take(8).collect()
    }

    /// Prepared reply link with subject and greeting
    pub fn reply_mailto(&self, site_name: &str) -> String {
        let body = format!(
            "Dear {},\r\n\r\nThank you for reaching out to {}.\r\n\r\n",
            self.name, site_name
        );
        format!(
            "mailto:{}?subject={}&body={}",
            self.email,
            urlencoding::encode("Re: Your Help Request"),
            urlencoding::encode(&body)
        )
    }
}

/// Insert payload for `help_requests`
#[derive(Debug, Clone, Serialize)]
pub struct NewHelpRequest {
    pub name: String,
    pub email: String,
    pub message: String,
    pub consent_given: bool,
    pub status: HelpRequestStatus,
}
