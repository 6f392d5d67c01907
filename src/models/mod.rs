//! Data models
//!
//! This module contains the data structures used throughout the site:
//! - Backend table rows (Resource, CommunityPost, HelpRequest, AdminProfile)
//! - Insert/update payloads sent to the backend
//! - Auth session types and the combined feed

mod community_post;
mod feed;
mod help_request;
mod resource;
mod session;

pub use community_post::{CommunityPost, NewCommunityPost, PostChanges};
pub use feed::{FeedItem, FeedItemKind, FeedPage};
pub use help_request::{HelpRequest, HelpRequestStatus, NewHelpRequest};
pub use resource::{
    category_slug, is_known_category, make_excerpt, truncate_with_ellipsis, CategoryGroup,
    NewResource, Resource, ResourceChanges, EXCERPT_LENGTH, RESOURCE_CATEGORIES,
};
pub use session::{AdminProfile, AdminSession, AuthSession, AuthUser};
