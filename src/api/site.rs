//! Public site pages

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;
use uuid::Uuid;

use crate::api::common::{checkbox, PageQuery, SearchQuery};
use crate::api::middleware::{AppState, PageError};
use crate::models::{CommunityPost, FeedItem, FeedItemKind};
use crate::services::{parse_page, CommunityServiceError, ContactInput};

/// Community posts shown on the home page
const HOME_POST_COUNT: usize = 2;

/// GET /
pub async fn home(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let posts = match state.community_service.latest(HOME_POST_COUNT).await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::warn!(error = %e, "latest community posts unavailable");
            Vec::new()
        }
    };

    let mut context = TeraContext::new();
    context.insert("posts", &posts);
    state.render("home.html", &context, "/")
}

/// GET /about
pub async fn about(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    state.render("about.html", &TeraContext::new(), "/about")
}

/// GET /services
pub async fn services(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    state.render("services.html", &TeraContext::new(), "/services")
}

/// GET /resources?q=
pub async fn resources(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>, PageError> {
    let search = query.q.unwrap_or_default();
    let mut context = TeraContext::new();
    context.insert("search", search.trim());

    match state.resource_service.grouped(Some(&search)).await {
        Ok(groups) => context.insert("groups", &groups),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load resources");
            context.insert("groups", &Vec::<()>::new());
            context.insert("error", &e.to_string());
        }
    }
    state.render("resources.html", &context, "/resources")
}

/// GET /resources/{category}
pub async fn resource_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Html<String>, PageError> {
    let path = format!("/resources/{}", category);
    let group = state.resource_service.by_category_slug(&category).await.map_err(|e| {
        tracing::warn!(error = %e, "failed to load resources");
        state.error_page(axum::http::StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), &path)
    })?;

    match group {
        Some(group) => {
            let mut context = TeraContext::new();
            context.insert("group", &group);
            state.render("resource_category.html", &context, &path)
        }
        None => Err(state.not_found(&path)),
    }
}

/// A feed entry with its link resolved for the template
#[derive(Serialize)]
struct FeedCard {
    #[serde(flatten)]
    item: FeedItem,
    href: String,
    is_resource: bool,
}

impl From<FeedItem> for FeedCard {
    fn from(item: FeedItem) -> Self {
        Self {
            href: item.href(),
            is_resource: item.kind == FeedItemKind::Resource,
            item,
        }
    }
}

/// GET /community?page=
pub async fn community(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, PageError> {
    let page = parse_page(query.page.as_deref());
    let mut context = TeraContext::new();

    match state.community_service.feed_page(page).await {
        Ok(feed) => {
            context.insert("page", &feed.page);
            context.insert("total", &feed.total);
            context.insert("total_pages", &feed.total_pages);
            context.insert("has_previous", &feed.has_previous());
            context.insert("has_next", &feed.has_next());
            let cards: Vec<FeedCard> = feed.items.into_iter().map(FeedCard::from).collect();
            context.insert("items", &cards);
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load community feed");
            context.insert("page", &page);
            context.insert("total", &0);
            context.insert("total_pages", &0);
            context.insert("has_previous", &false);
            context.insert("has_next", &false);
            context.insert("items", &Vec::<()>::new());
            context.insert("error", &e.to_string());
        }
    }
    state.render("community.html", &context, "/community")
}

/// A post with its body split for display
#[derive(Serialize)]
struct PostView<'a> {
    #[serde(flatten)]
    post: &'a CommunityPost,
    paragraphs: Vec<&'a str>,
    link_label: Option<&'static str>,
}

/// GET /community/{id}
pub async fn community_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, PageError> {
    let path = format!("/community/{}", id);
    let Ok(id) = Uuid::parse_str(&id) else {
        return Err(state.not_found(&path));
    };

    let post = match state.community_service.get_published(id).await {
        Ok(post) => post,
        Err(CommunityServiceError::NotFound) => return Err(state.not_found(&path)),
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "failed to load community post");
            return Err(state.not_found(&path));
        }
    };

    let view = PostView {
        paragraphs: post.paragraphs(),
        link_label: post.link_label(),
        post: &post,
    };
    let mut context = TeraContext::new();
    context.insert("post", &view);
    state.render("community_post.html", &context, &path)
}

/// Contact form fields as posted
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub consent: Option<String>,
}

/// GET /contact
pub async fn contact_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    render_contact(&state, &ContactForm::default(), None, false)
}

/// POST /contact
pub async fn contact_submit(State(state): State<AppState>, Form(form): Form<ContactForm>) -> Response {
    let input = ContactInput {
        name: form.name.clone(),
        email: form.email.clone(),
        message: form.message.clone(),
        consent: checkbox(form.consent.as_deref()),
    };

    let result = match state.help_request_service.submit(input).await {
        Ok(()) => render_contact(&state, &ContactForm::default(), None, true),
        Err(e) => render_contact(&state, &form, Some(&e.public_message()), false),
    };
    result.into_response()
}

fn render_contact(
    state: &AppState,
    form: &ContactForm,
    error: Option<&str>,
    submitted: bool,
) -> Result<Html<String>, PageError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("error", &error);
    context.insert("submitted", &submitted);
    state.render("contact.html", &context, "/contact")
}
