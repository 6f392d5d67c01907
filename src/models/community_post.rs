//! Community feed post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the `community_feed` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    pub published: bool,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl CommunityPost {
    /// Content split into paragraphs on blank lines
    pub fn paragraphs(&self) -> Vec<&str> {
        self.content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Call-to-action label for the post link
    pub fn link_label(&self) -> Option<&'static str> {
        self.link_url.as_deref().map(|url| {
            if url.starts_with("mailto") {
                "Contact for More Information"
            } else {
                "Learn More"
            }
        })
    }
}

/// Insert payload for `community_feed`
#[derive(Debug, Clone, Serialize)]
pub struct NewCommunityPost {
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub published: bool,
}

/// Update payload for `community_feed`
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl PostChanges {
    pub fn publish_state(published: bool) -> Self {
        Self {
            published: Some(published),
            ..Default::default()
        }
    }

    /// Apply these changes to an in-memory row
    pub fn apply_to(&self, post: &mut CommunityPost) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
        if let Some(published) = self.published {
            post.published = published;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(content: &str, link: Option<&str>) -> CommunityPost {
        CommunityPost {
            id: Uuid::new_v4(),
            title: "Gathering".to_string(),
            content: content.to_string(),
            image_url: None,
            link_url: link.map(str::to_string),
            published: true,
            author_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let p = post("First line\nstill first\n\nSecond\n\n\n\nThird", None);
        assert_eq!(p.paragraphs(), vec!["First line\nstill first", "Second", "Third"]);
    }

    #[test]
    fn test_link_label() {
        assert_eq!(post("x", None).link_label(), None);
        assert_eq!(
            post("x", Some("mailto:info@example.org")).link_label(),
            Some("Contact for More Information")
        );
        assert_eq!(post("x", Some("https://example.org")).link_label(), Some("Learn More"));
    }

    #[test]
    fn test_publish_state_changes_only_published() {
        let body = serde_json::to_value(PostChanges::publish_state(true)).unwrap();
        assert_eq!(body, serde_json::json!({ "published": true }));
    }
}
