//! Resource service
//!
//! Public side: published resources grouped by category, per-category pages
//! and a title/category search. Admin side: create, edit, publish toggling and
//! deletion. Form input is validated completely before the backend is called.

use std::sync::Arc;
use uuid::Uuid;

use crate::backend::repositories::ResourceRepository;
use crate::backend::{BackendError, Credential, ObjectStorage};
use crate::models::{
    category_slug, is_known_category, make_excerpt, AdminSession, CategoryGroup, NewResource, Resource,
    ResourceChanges,
};
use crate::services::image::{store_image, ImageChoice, ImageInput};

/// Error types for resource operations
#[derive(Debug, thiserror::Error)]
pub enum ResourceServiceError {
    /// Form input rejected before any backend call
    #[error("{0}")]
    Validation(String),

    #[error("Resource not found")]
    NotFound,

    /// Backend failure, message passed through unchanged
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Fields of the admin resource form
#[derive(Debug, Clone, Default)]
pub struct ResourceInput {
    pub title: String,
    pub category: String,
    pub content: String,
    pub resource_url: Option<String>,
    pub published: bool,
    pub image: ImageInput,
}

/// Input that passed validation
struct ValidResource {
    title: String,
    category: String,
    content: String,
    resource_url: Option<String>,
    published: bool,
    image: ImageChoice,
}

impl ResourceInput {
    fn validate(self) -> Result<ValidResource, ResourceServiceError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ResourceServiceError::Validation("Title is required".to_string()));
        }
        let category = self.category.trim().to_string();
        if category.is_empty() {
            return Err(ResourceServiceError::Validation("Category is required".to_string()));
        }
        if !is_known_category(&category) {
            return Err(ResourceServiceError::Validation(format!("Unknown category: {}", category)));
        }
        if self.content.trim().is_empty() {
            return Err(ResourceServiceError::Validation("Content is required".to_string()));
        }
        let image = self
            .image
            .resolve()
            .map_err(|e| ResourceServiceError::Validation(e.to_string()))?;

        Ok(ValidResource {
            title,
            category,
            content: self.content,
            resource_url: self
                .resource_url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            published: self.published,
            image,
        })
    }
}

pub struct ResourceService {
    repo: Arc<dyn ResourceRepository>,
    storage: Arc<dyn ObjectStorage>,
}

impl ResourceService {
    pub fn new(repo: Arc<dyn ResourceRepository>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { repo, storage }
    }

    /// Published resources, newest first
    ///
    /// Rows are re-checked here so a draft never reaches a public page even if
    /// the backend filter is misconfigured.
    pub async fn list_published(&self) -> Result<Vec<Resource>, ResourceServiceError> {
        let rows = self.repo.list_published(&Credential::Anonymous).await?;
        Ok(rows.into_iter().filter(|r| r.published).collect())
    }

    /// Published resources grouped by category, optionally narrowed by a search term
    pub async fn grouped(&self, search: Option<&str>) -> Result<Vec<CategoryGroup>, ResourceServiceError> {
        let rows = self.list_published().await?;
        let rows = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => rows.into_iter().filter(|r| matches_search(r, term)).collect(),
            None => rows,
        };
        Ok(group_by_category(rows))
    }

    /// The group for one category slug; `None` when no published resource has it
    pub async fn by_category_slug(&self, slug: &str) -> Result<Option<CategoryGroup>, ResourceServiceError> {
        let groups = self.grouped(None).await?;
        Ok(groups.into_iter().find(|g| g.slug == slug))
    }

    /// Every resource, drafts included
    pub async fn list_all(&self, session: &AdminSession) -> Result<Vec<Resource>, ResourceServiceError> {
        Ok(self.repo.list_all(&Credential::from(session)).await?)
    }

    pub async fn get(&self, session: &AdminSession, id: Uuid) -> Result<Resource, ResourceServiceError> {
        self.repo
            .get_by_id(&Credential::from(session), id)
            .await?
            .ok_or(ResourceServiceError::NotFound)
    }

    pub async fn create(&self, session: &AdminSession, input: ResourceInput) -> Result<Resource, ResourceServiceError> {
        let valid = input.validate()?;
        let credential = Credential::from(session);
        let image_url = store_image(self.storage.as_ref(), &credential, valid.image).await?;

        let new = NewResource {
            excerpt: make_excerpt(&valid.content),
            title: valid.title,
            content: valid.content,
            category: valid.category,
            author_id: session.user_id(),
            published: valid.published,
            image_url,
            resource_url: valid.resource_url,
        };
        let resource = self.repo.create(&credential, &new).await?;
        tracing::info!(id = %resource.id, title = %resource.title, "resource created");
        Ok(resource)
    }

    /// Replace every editable field of a resource
    pub async fn update(
        &self,
        session: &AdminSession,
        id: Uuid,
        input: ResourceInput,
    ) -> Result<Resource, ResourceServiceError> {
        let valid = input.validate()?;
        let credential = Credential::from(session);
        let image_url = store_image(self.storage.as_ref(), &credential, valid.image).await?;

        let changes = ResourceChanges {
            excerpt: Some(make_excerpt(&valid.content)),
            title: Some(valid.title),
            content: Some(valid.content),
            category: Some(valid.category),
            image_url: Some(image_url),
            resource_url: Some(valid.resource_url),
            published: Some(valid.published),
        };
        let resource = self
            .repo
            .update(&credential, id, &changes)
            .await?
            .ok_or(ResourceServiceError::NotFound)?;
        tracing::info!(id = %id, "resource updated");
        Ok(resource)
    }

    /// Flip the `published` flag of one resource
    pub async fn toggle_publish(&self, session: &AdminSession, id: Uuid) -> Result<Resource, ResourceServiceError> {
        let credential = Credential::from(session);
        let current = self
            .repo
            .get_by_id(&credential, id)
            .await?
            .ok_or(ResourceServiceError::NotFound)?;

        let changes = ResourceChanges {
            published: Some(!current.published),
            ..Default::default()
        };
        let resource = self
            .repo
            .update(&credential, id, &changes)
            .await?
            .ok_or(ResourceServiceError::NotFound)?;
        tracing::info!(id = %id, published = resource.published, "resource publish state changed");
        Ok(resource)
    }

    pub async fn delete(&self, session: &AdminSession, id: Uuid) -> Result<(), ResourceServiceError> {
        self.repo.delete(&Credential::from(session), id).await?;
        tracing::info!(id = %id, "resource deleted");
        Ok(())
    }
}

/// Case-insensitive match on title or category
pub fn matches_search(resource: &Resource, term: &str) -> bool {
    let term = term.to_lowercase();
    resource.title.to_lowercase().contains(&term) || resource.category.to_lowercase().contains(&term)
}

/// Group resources by category, keeping the order in which categories first appear
pub fn group_by_category(resources: Vec<Resource>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for resource in resources {
        match groups.iter_mut().find(|g| g.name == resource.category) {
            Some(group) => group.resources.push(resource),
            None => groups.push(CategoryGroup {
                name: resource.category.clone(),
                slug: category_slug(&resource.category),
                resources: vec![resource],
            }),
        }
    }
    groups
}
