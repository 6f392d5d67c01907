//! Help request service
//!
//! Contact form submissions from visitors and the admin inbox that lists them.

use std::sync::Arc;

use crate::backend::repositories::HelpRequestRepository;
use crate::backend::{BackendError, Credential};
use crate::models::{AdminSession, HelpRequest, HelpRequestStatus, NewHelpRequest};

/// Shown to visitors when a submission could not be stored
pub const SUBMIT_FAILED_MESSAGE: &str = "An error occurred. Please try again or contact us directly via email.";

#[derive(Debug, thiserror::Error)]
pub enum HelpRequestError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl HelpRequestError {
    /// Message for the contact page; backend details stay in the log
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Backend(_) => SUBMIT_FAILED_MESSAGE.to_string(),
        }
    }
}

/// Fields of the public contact form
#[derive(Debug, Clone, Default)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub message: String,
    pub consent: bool,
}

impl ContactInput {
    fn validate(&self) -> Result<(), HelpRequestError> {
        if self.name.trim().is_empty() {
            return Err(HelpRequestError::Validation("Name is required".to_string()));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(HelpRequestError::Validation("Email is required".to_string()));
        }
        if !looks_like_email(email) {
            return Err(HelpRequestError::Validation("Please enter a valid email address".to_string()));
        }
        if self.message.trim().is_empty() {
            return Err(HelpRequestError::Validation("Message is required".to_string()));
        }
        if !self.consent {
            return Err(HelpRequestError::Validation(
                "Please provide consent to proceed with your request.".to_string(),
            ));
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

pub struct HelpRequestService {
    repo: Arc<dyn HelpRequestRepository>,
    store_submissions: bool,
}

impl HelpRequestService {
    pub fn new(repo: Arc<dyn HelpRequestRepository>, store_submissions: bool) -> Self {
        Self {
            repo,
            store_submissions,
        }
    }

    /// Validate a contact form submission and record it as a new help request
    pub async fn submit(&self, input: ContactInput) -> Result<(), HelpRequestError> {
        input.validate()?;

        if !self.store_submissions {
            tracing::info!("help request acknowledged without storing");
            return Ok(());
        }

        let request = NewHelpRequest {
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            message: input.message,
            consent_given: input.consent,
            status: HelpRequestStatus::New,
        };
        self.repo.create(&Credential::Anonymous, &request).await?;
        tracing::info!("help request stored");
        Ok(())
    }

    /// Every help request, newest first
    pub async fn list(&self, session: &AdminSession) -> Result<Vec<HelpRequest>, HelpRequestError> {
        Ok(self.repo.list_all(&Credential::from(session)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryHelpRequests;

    fn input() -> ContactInput {
        ContactInput {
            name: "Hannah".to_string(),
            email: "hannah@example.org".to_string(),
            message: "I would like to talk to someone.".to_string(),
            consent: true,
        }
    }

    #[tokio::test]
    async fn test_submit_stores_new_request_anonymously() {
        let repo = MemoryHelpRequests::new();
        let service = HelpRequestService::new(repo.clone(), true);

        service.submit(input()).await.unwrap();

        let rows = repo.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, HelpRequestStatus::New);
        assert!(rows[0].consent_given);
        assert_eq!(*repo.last_credential.lock().unwrap(), Some(Credential::Anonymous));
    }

    #[tokio::test]
    async fn test_missing_consent_rejected() {
        let repo = MemoryHelpRequests::new();
        let service = HelpRequestService::new(repo.clone(), true);

        let err = service
            .submit(ContactInput {
                consent: false,
                ..input()
            })
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Please provide consent to proceed with your request.");
        assert_eq!(repo.probe.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let service = HelpRequestService::new(MemoryHelpRequests::new(), true);
        for email in ["", "no-at-sign", "@example.org", "a@localhost"] {
            let result = service
                .submit(ContactInput {
                    email: email.to_string(),
                    ..input()
                })
                .await;
            assert!(matches!(result, Err(HelpRequestError::Validation(_))), "{}", email);
        }
    }

    #[tokio::test]
    async fn test_backend_failure_uses_generic_message() {
        let repo = MemoryHelpRequests::new();
        repo.probe.fail_with("permission denied for table help_requests");
        let service = HelpRequestService::new(repo, true);

        let err = service.submit(input()).await.unwrap_err();
        assert_eq!(err.public_message(), SUBMIT_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_acknowledge_only_mode() {
        let repo = MemoryHelpRequests::new();
        let service = HelpRequestService::new(repo.clone(), false);
        service.submit(input()).await.unwrap();
        assert_eq!(repo.probe.calls(), 0);
    }
}
