//! Admin authentication service
//!
//! An account is an admin when the auth service accepts its token *and* an
//! `admin_profiles` row exists for its user id. Both checks run on login and
//! again on every request to an admin route.

use std::sync::Arc;

use crate::backend::repositories::AdminProfileRepository;
use crate::backend::{AuthProvider, BackendError, Credential, SignUpRequest};
use crate::models::{AdminProfile, AdminSession, AuthSession, AuthUser};

/// Minimum password length accepted by the signup form
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Access denied. Admin privileges required.")]
    AccessDenied,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Login form fields
#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Signup form fields
#[derive(Debug, Clone, Default)]
pub struct SignupInput {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// A successful admin login
#[derive(Debug, Clone)]
pub struct AdminLogin {
    pub session: AuthSession,
    pub profile: AdminProfile,
}

/// Outcome of checking a request against the admin gate
#[derive(Debug, Clone)]
pub enum GateState {
    Unverified,
    Verified(AdminSession),
}

impl GateState {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// Gate state plus the session that replaced an expired access token
#[derive(Debug, Clone)]
pub struct SessionCheck {
    pub state: GateState,
    pub renewed: Option<AuthSession>,
}

impl SessionCheck {
    fn unverified() -> Self {
        Self {
            state: GateState::Unverified,
            renewed: None,
        }
    }
}

pub struct AuthService {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn AdminProfileRepository>,
    public_url: String,
}

impl AuthService {
    pub fn new(auth: Arc<dyn AuthProvider>, profiles: Arc<dyn AdminProfileRepository>, public_url: &str) -> Self {
        Self {
            auth,
            profiles,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Sign in with email and password; only accounts with an admin profile get through
    pub async fn login(&self, input: LoginInput) -> Result<AdminLogin, AuthServiceError> {
        let email = input.email.trim();
        if email.is_empty() || input.password.is_empty() {
            return Err(AuthServiceError::Validation("Email and password are required".to_string()));
        }

        let session = match self.auth.sign_in_with_password(email, &input.password).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "admin sign-in rejected");
                return Err(AuthServiceError::InvalidCredentials);
            }
        };

        match self.admin_profile(&session.access_token, &session.user).await {
            Some(profile) => {
                tracing::info!(user_id = %session.user.id, "admin signed in");
                Ok(AdminLogin { session, profile })
            }
            None => {
                self.logout(&session.access_token).await;
                Err(AuthServiceError::AccessDenied)
            }
        }
    }

    /// Register a new account; the confirmation link leads to the dashboard
    pub async fn signup(&self, input: SignupInput) -> Result<(), AuthServiceError> {
        let email = input.email.trim();
        if email.is_empty() {
            return Err(AuthServiceError::Validation("Email is required".to_string()));
        }
        if input.password != input.confirm_password {
            return Err(AuthServiceError::Validation("Passwords do not match".to_string()));
        }
        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthServiceError::Validation(
                "Password must be at least 6 characters long".to_string(),
            ));
        }

        let request = SignUpRequest {
            email: email.to_string(),
            password: input.password,
            full_name: input.full_name.trim().to_string(),
            redirect_to: format!("{}/admin/dashboard", self.public_url),
        };
        self.auth.sign_up(&request).await?;
        tracing::info!("admin signup submitted");
        Ok(())
    }

    /// Resolve an access token into the gate state
    pub async fn verify(&self, access_token: Option<&str>) -> GateState {
        self.check_session(access_token, None).await.state
    }

    /// Resolve the session cookies into the gate state
    ///
    /// A missing or rejected access token is replaced through the refresh
    /// token; the new session is returned so its cookies can be re-issued.
    pub async fn check_session(&self, access_token: Option<&str>, refresh_token: Option<&str>) -> SessionCheck {
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            match self.auth.get_user(token).await {
                Ok(Some(user)) => {
                    return SessionCheck {
                        state: self.admin_state(token, user).await,
                        renewed: None,
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "session lookup failed");
                    return SessionCheck::unverified();
                }
            }
        }

        let Some(refresh_token) = refresh_token.filter(|t| !t.is_empty()) else {
            return SessionCheck::unverified();
        };
        let session = match self.auth.refresh_session(refresh_token).await {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!(error = %e, "session refresh rejected");
                return SessionCheck::unverified();
            }
        };

        match self.admin_state(&session.access_token, session.user.clone()).await {
            GateState::Verified(admin) => {
                tracing::debug!(user_id = %admin.user_id(), "admin session refreshed");
                SessionCheck {
                    state: GateState::Verified(admin),
                    renewed: Some(session),
                }
            }
            GateState::Unverified => SessionCheck::unverified(),
        }
    }

    /// Revoke a session; failures are logged and otherwise ignored
    pub async fn logout(&self, access_token: &str) {
        if let Err(e) = self.auth.sign_out(access_token).await {
            tracing::warn!(error = %e, "sign-out failed");
        }
    }

    async fn admin_state(&self, access_token: &str, user: AuthUser) -> GateState {
        match self.admin_profile(access_token, &user).await {
            Some(profile) => GateState::Verified(AdminSession {
                user,
                profile,
                access_token: access_token.to_string(),
            }),
            None => GateState::Unverified,
        }
    }

    async fn admin_profile(&self, access_token: &str, user: &AuthUser) -> Option<AdminProfile> {
        let credential = Credential::User(access_token.to_string());
        match self.profiles.get_by_user_id(&credential, user.id).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                tracing::debug!(user_id = %user.id, "no admin profile for user");
                None
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "admin profile lookup failed");
                None
            }
        }
    }
}
