//! Table repositories
//!
//! One repository per backend table. Each trait is the seam services depend
//! on; the `Rest*` implementations talk to `/rest/v1` through the shared
//! [`BackendClient`](super::BackendClient).

pub mod admin_profile;
pub mod community;
pub mod help_request;
pub mod resource;

pub use admin_profile::{AdminProfileRepository, RestAdminProfileRepository};
pub use community::{CommunityRepository, RestCommunityRepository};
pub use help_request::{HelpRequestRepository, RestHelpRequestRepository};
pub use resource::{ResourceRepository, RestResourceRepository};
