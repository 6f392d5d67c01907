//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the backend repositories. They
//! are responsible for:
//! - Validating form input before anything reaches the backend
//! - Choosing the credential each backend call runs with
//! - Shaping rows into what the pages render

pub mod analytics;
pub mod auth;
pub mod community;
pub mod dashboard;
pub mod feed;
pub mod google_auth;
pub mod help_request;
pub mod image;
pub mod resource;

pub use analytics::{AnalyticsError, AnalyticsService, AnalyticsSummary, Ga4Client, ReportClient};
pub use auth::{AdminLogin, AuthService, AuthServiceError, GateState, LoginInput, SessionCheck, SignupInput};
pub use community::{CommunityService, CommunityServiceError, PostEdit, PostInput};
pub use dashboard::{DashboardService, DashboardStats};
pub use feed::{merge_feed, parse_page, POSTS_PER_PAGE};
pub use help_request::{ContactInput, HelpRequestError, HelpRequestService};
pub use image::{ImageInput, ImageUpload};
pub use resource::{ResourceInput, ResourceService, ResourceServiceError};
