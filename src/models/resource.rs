//! Resource model (articles, guides and healing materials)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed set of resource categories offered by the admin form
pub const RESOURCE_CATEGORIES: [&str; 10] = [
    "Spiritual Growth",
    "Mental Health",
    "Emotional Healing",
    "Relationships",
    "Prayer & Worship",
    "Biblical Studies",
    "Self-Care",
    "Grief & Loss",
    "Anxiety & Depression",
    "Forgiveness",
];

/// Maximum characters kept in an excerpt before the ellipsis
pub const EXCERPT_LENGTH: usize = 150;

/// A row of the `resources` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub resource_url: Option<String>,
    pub published: bool,
    #[serde(default)]
    pub author_id: Option<Uuid>,
}

impl Resource {
    /// Text shown on resource cards
    pub fn summary(&self) -> String {
        match self.excerpt.as_deref() {
            Some(excerpt) if !excerpt.is_empty() => excerpt.to_string(),
            _ => make_excerpt(&self.content),
        }
    }

    pub fn category_slug(&self) -> String {
        category_slug(&self.category)
    }
}

/// Content itself when short, otherwise the first 150 characters plus "..."
pub fn make_excerpt(content: &str) -> String {
    truncate_with_ellipsis(content, EXCERPT_LENGTH)
}

/// Cut `text` to `max` characters, appending "..." when anything was dropped
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut cut: String = text.chars().take(max).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

/// Anchor/route slug for a category: lower-cased with spaces turned into dashes
pub fn category_slug(category: &str) -> String {
    category.to_lowercase().replace(' ', "-")
}

/// Whether `category` is one of the fixed categories
pub fn is_known_category(category: &str) -> bool {
    RESOURCE_CATEGORIES.contains(&category)
}

/// Insert payload for `resources`
#[derive(Debug, Clone, Serialize)]
pub struct NewResource {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub author_id: Uuid,
    pub published: bool,
    pub image_url: Option<String>,
    pub resource_url: Option<String>,
}

/// Update payload for `resources`
///
/// `None` fields are left out of the PATCH body and keep their stored value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl ResourceChanges {
    /// Apply these changes to an in-memory row
    pub fn apply_to(&self, resource: &mut Resource) {
        if let Some(title) = &self.title {
            resource.title = title.clone();
        }
        if let Some(content) = &self.content {
            resource.content = content.clone();
        }
        if let Some(excerpt) = &self.excerpt {
            resource.excerpt = Some(excerpt.clone());
        }
        if let Some(category) = &self.category {
            resource.category = category.clone();
        }
        if let Some(image_url) = &self.image_url {
            resource.image_url = image_url.clone();
        }
        if let Some(resource_url) = &self.resource_url {
            resource.resource_url = resource_url.clone();
        }
        if let Some(published) = self.published {
            resource.published = published;
        }
    }
}

/// Published resources of one category, as rendered on the resources page
#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup {
    pub name: String,
    pub slug: String,
    pub resources: Vec<Resource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(content: &str, excerpt: Option<&str>) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            title: "Title".to_string(),
            content: content.to_string(),
            excerpt: excerpt.map(str::to_string),
            category: "Prayer & Worship".to_string(),
            created_at: Utc::now(),
            image_url: None,
            resource_url: None,
            published: true,
            author_id: None,
        }
    }

    #[test]
    fn test_excerpt_keeps_short_content() {
        assert_eq!(make_excerpt("short"), "short");
        let exact = "a".repeat(150);
        assert_eq!(make_excerpt(&exact), exact);
    }

    #[test]
    fn test_excerpt_truncates_long_content() {
        let long = "b".repeat(151);
        let excerpt = make_excerpt(&long);
        assert_eq!(excerpt.len(), 153);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let long = "é".repeat(160);
        let excerpt = make_excerpt(&long);
        assert_eq!(excerpt.chars().count(), 153);
    }

    #[test]
    fn test_summary_prefers_excerpt() {
        assert_eq!(resource("body", Some("excerpt")).summary(), "excerpt");
        assert_eq!(resource("body", Some("")).summary(), "body");
        assert_eq!(resource("body", None).summary(), "body");
    }

    #[test]
    fn test_category_slug() {
        assert_eq!(category_slug("Prayer & Worship"), "prayer-&-worship");
        assert_eq!(category_slug("Self-Care"), "self-care");
        assert_eq!(resource("x", None).category_slug(), "prayer-&-worship");
    }

    #[test]
    fn test_known_categories() {
        assert!(is_known_category("Forgiveness"));
        assert!(!is_known_category("forgiveness"));
        assert!(!is_known_category(""));
    }

    #[test]
    fn test_changes_skip_unset_fields() {
        let changes = ResourceChanges {
            published: Some(false),
            ..Default::default()
        };
        let body = serde_json::to_value(&changes).unwrap();
        assert_eq!(body, serde_json::json!({ "published": false }));
    }

    #[test]
    fn test_changes_can_clear_nullable_fields() {
        let changes = ResourceChanges {
            image_url: Some(None),
            ..Default::default()
        };
        let body = serde_json::to_value(&changes).unwrap();
        assert_eq!(body, serde_json::json!({ "image_url": null }));
    }
}
