//! Community service
//!
//! Serves the public feed and post pages and the admin post screens.

use std::sync::Arc;
use uuid::Uuid;

use crate::backend::repositories::{CommunityRepository, ResourceRepository};
use crate::backend::{BackendError, Credential, ObjectStorage};
use crate::models::{AdminSession, CommunityPost, FeedPage, NewCommunityPost, PostChanges};
use crate::services::feed::{merge_feed, POSTS_PER_PAGE};
use crate::services::image::{store_image, ImageInput};

/// Error types for community post operations
#[derive(Debug, thiserror::Error)]
pub enum CommunityServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Post not found")]
    NotFound,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Fields of the admin "new post" form
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub link_url: Option<String>,
    pub published: bool,
    pub image: ImageInput,
}

/// Fields of the admin post edit form
#[derive(Debug, Clone, Default)]
pub struct PostEdit {
    pub title: String,
    pub content: String,
}

fn require_title_and_content(title: &str, content: &str) -> Result<(), CommunityServiceError> {
    if title.trim().is_empty() {
        return Err(CommunityServiceError::Validation("Title is required".to_string()));
    }
    if content.trim().is_empty() {
        return Err(CommunityServiceError::Validation("Content is required".to_string()));
    }
    Ok(())
}

pub struct CommunityService {
    posts: Arc<dyn CommunityRepository>,
    resources: Arc<dyn ResourceRepository>,
    storage: Arc<dyn ObjectStorage>,
}

impl CommunityService {
    pub fn new(
        posts: Arc<dyn CommunityRepository>,
        resources: Arc<dyn ResourceRepository>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            posts,
            resources,
            storage,
        }
    }

    /// One page of the merged feed of published posts and resources
    pub async fn feed_page(&self, page: u32) -> Result<FeedPage, CommunityServiceError> {
        let credential = Credential::Anonymous;
        let (posts, resources) = tokio::try_join!(
            self.posts.list_published(&credential, None),
            self.resources.list_published(&credential),
        )?;

        let posts = posts.into_iter().filter(|p| p.published).collect();
        let resources = resources.into_iter().filter(|r| r.published).collect();
        Ok(merge_feed(posts, resources, page, POSTS_PER_PAGE))
    }

    /// A published post by id
    pub async fn get_published(&self, id: Uuid) -> Result<CommunityPost, CommunityServiceError> {
        self.posts
            .get_by_id(&Credential::Anonymous, id)
            .await?
            .filter(|p| p.published)
            .ok_or(CommunityServiceError::NotFound)
    }

    /// The `limit` newest published posts
    pub async fn latest(&self, limit: usize) -> Result<Vec<CommunityPost>, CommunityServiceError> {
        let rows = self.posts.list_published(&Credential::Anonymous, Some(limit)).await?;
        Ok(rows.into_iter().filter(|p| p.published).take(limit).collect())
    }

    pub async fn list_all(&self, session: &AdminSession) -> Result<Vec<CommunityPost>, CommunityServiceError> {
        Ok(self.posts.list_all(&Credential::from(session)).await?)
    }

    pub async fn get(&self, session: &AdminSession, id: Uuid) -> Result<CommunityPost, CommunityServiceError> {
        self.posts
            .get_by_id(&Credential::from(session), id)
            .await?
            .ok_or(CommunityServiceError::NotFound)
    }

    pub async fn create(&self, session: &AdminSession, input: PostInput) -> Result<CommunityPost, CommunityServiceError> {
        require_title_and_content(&input.title, &input.content)?;
        let image = input
            .image
            .resolve()
            .map_err(|e| CommunityServiceError::Validation(e.to_string()))?;

        let credential = Credential::from(session);
        let image_url = store_image(self.storage.as_ref(), &credential, image).await?;

        let new = NewCommunityPost {
            title: input.title.trim().to_string(),
            content: input.content,
            author_id: session.user_id(),
            image_url,
            link_url: input.link_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
            published: input.published,
        };
        let post = self.posts.create(&credential, &new).await?;
        tracing::info!(id = %post.id, title = %post.title, "community post created");
        Ok(post)
    }

    /// Change the title and content of a post
    pub async fn update(
        &self,
        session: &AdminSession,
        id: Uuid,
        edit: PostEdit,
    ) -> Result<CommunityPost, CommunityServiceError> {
        require_title_and_content(&edit.title, &edit.content)?;

        let changes = PostChanges {
            title: Some(edit.title.trim().to_string()),
            content: Some(edit.content),
            published: None,
        };
        let post = self
            .posts
            .update(&Credential::from(session), id, &changes)
            .await?
            .ok_or(CommunityServiceError::NotFound)?;
        tracing::info!(id = %id, "community post updated");
        Ok(post)
    }

    /// Flip the `published` flag of one post
    pub async fn toggle_publish(&self, session: &AdminSession, id: Uuid) -> Result<CommunityPost, CommunityServiceError> {
        let credential = Credential::from(session);
        let current = self
            .posts
            .get_by_id(&credential, id)
            .await?
            .ok_or(CommunityServiceError::NotFound)?;

        let post = self
            .posts
            .update(&credential, id, &PostChanges::publish_state(!current.published))
            .await?
            .ok_or(CommunityServiceError::NotFound)?;
        tracing::info!(id = %id, published = post.published, "community post publish state changed");
        Ok(post)
    }

    pub async fn delete(&self, session: &AdminSession, id: Uuid) -> Result<(), CommunityServiceError> {
        self.posts.delete(&Credential::from(session), id).await?;
        tracing::info!(id = %id, "community post deleted");
        Ok(())
    }
}
