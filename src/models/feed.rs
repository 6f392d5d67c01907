//! Combined community feed types

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{category_slug, CommunityPost, Resource};

/// Origin table of a feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedItemKind {
    Community,
    Resource,
}

/// A community post or a resource normalized into the post shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub id: Uuid,
    pub kind: FeedItemKind,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub category: Option<String>,
}

impl FeedItem {
    /// Where the feed card links to
    pub fn href(&self) -> String {
        match self.kind {
            FeedItemKind::Community => format!("/community/{}", self.id),
            FeedItemKind::Resource => self.link_url.clone().unwrap_or_else(|| "/resources".to_string()),
        }
    }
}

impl From<CommunityPost> for FeedItem {
    fn from(post: CommunityPost) -> Self {
        Self {
            id: post.id,
            kind: FeedItemKind::Community,
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            image_url: post.image_url,
            link_url: post.link_url,
            category: None,
        }
    }
}

impl From<Resource> for FeedItem {
    fn from(resource: Resource) -> Self {
        Self {
            id: resource.id,
            kind: FeedItemKind::Resource,
            link_url: Some(format!("/resources#{}", category_slug(&resource.category))),
            title: resource.title,
            content: resource.content,
            created_at: resource.created_at,
            image_url: None,
            category: Some(resource.category),
        }
    }
}

/// One page of the combined feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub total: usize,
    pub page: u32,
    pub page_size: usize,
    pub total_pages: usize,
}

impl FeedPage {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        (self.page as usize) < self.total_pages
    }
}
