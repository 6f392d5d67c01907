//! Admin pages
//!
//! Every handler here sits behind the admin gate and receives the verified
//! [`AdminSession`] as a request extension. Forms are validated by the
//! services; any failure re-renders the form with the message, success
//! redirects back to the list with a notice.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;
use uuid::Uuid;

use crate::api::common::{checkbox, non_empty, redirect_with_error, redirect_with_notice, NoticeQuery};
use crate::api::middleware::{AppState, PageError};
use crate::api::upload::{read_form, FormData};
use crate::models::{AdminSession, CommunityPost, HelpRequest, Resource, RESOURCE_CATEGORIES};
use crate::services::{
    CommunityServiceError, ImageInput, PostEdit, PostInput, ResourceInput, ResourceServiceError,
};

/// Context every admin page starts from
fn admin_context(session: &AdminSession, query: &NoticeQuery) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("admin_name", session.profile.display_name());
    context.insert("notice", &query.notice);
    context.insert("flash_error", &query.error);
    context
}

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

/// GET /admin
pub async fn index() -> Redirect {
    Redirect::to("/admin/dashboard")
}

/// GET /admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<Html<String>, PageError> {
    let stats = state.dashboard_service.stats(&session).await;
    let mut context = admin_context(&session, &NoticeQuery::default());
    context.insert("stats", &stats);
    state.render("admin/dashboard.html", &context, "/admin/dashboard")
}

/// GET /admin/analytics-dashboard
pub async fn analytics_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<Html<String>, PageError> {
    let mut context = admin_context(&session, &NoticeQuery::default());
    context.insert("analytics_enabled", &state.analytics_service.is_enabled());
    state.render("admin/analytics.html", &context, "/admin/analytics-dashboard")
}

/// GET /admin/help-requests
pub async fn help_requests(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<Html<String>, PageError> {
    #[derive(Serialize)]
    struct Row<'a> {
        #[serde(flatten)]
        request: &'a HelpRequest,
        short_id: String,
        reply_mailto: String,
    }

    let mut context = admin_context(&session, &NoticeQuery::default());
    match state.help_request_service.list(&session).await {
        Ok(requests) => {
            let rows: Vec<Row> = requests
                .iter()
                .map(|request| Row {
                    short_id: request.short_id(),
                    reply_mailto: request.reply_mailto(&state.site.name),
                    request,
                })
                .collect();
            context.insert("requests", &rows);
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load help requests");
            context.insert("requests", &Vec::<()>::new());
            context.insert("error", &e.to_string());
        }
    }
    state.render("admin/help_requests.html", &context, "/admin/help-requests")
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Values shown in the resource form
#[derive(Debug, Serialize)]
struct ResourceFormView {
    title: String,
    category: String,
    content: String,
    resource_url: String,
    image_url: String,
    published: bool,
}

impl Default for ResourceFormView {
    fn default() -> Self {
        Self {
            title: String::new(),
            category: String::new(),
            content: String::new(),
            resource_url: String::new(),
            image_url: String::new(),
            published: true,
        }
    }
}

impl From<&Resource> for ResourceFormView {
    fn from(resource: &Resource) -> Self {
        Self {
            title: resource.title.clone(),
            category: resource.category.clone(),
            content: resource.content.clone(),
            resource_url: resource.resource_url.clone().unwrap_or_default(),
            image_url: resource.image_url.clone().unwrap_or_default(),
            published: resource.published,
        }
    }
}

impl ResourceFormView {
    fn from_form(form: &FormData) -> Self {
        Self {
            title: form.text("title"),
            category: form.text("category"),
            content: form.text("content"),
            resource_url: form.text("resource_url"),
            image_url: form.text("image_url"),
            published: checkbox(form.get("published")),
        }
    }
}

fn resource_input(form: FormData) -> ResourceInput {
    ResourceInput {
        title: form.text("title"),
        category: form.text("category"),
        content: form.text("content"),
        resource_url: non_empty(form.get("resource_url").map(str::to_string)),
        published: checkbox(form.get("published")),
        image: ImageInput {
            url: non_empty(form.get("image_url").map(str::to_string)),
            upload: form.image,
        },
    }
}

fn render_resource_form(
    state: &AppState,
    session: &AdminSession,
    form: &ResourceFormView,
    editing: Option<Uuid>,
    error: Option<&str>,
) -> Result<Html<String>, PageError> {
    let (action, path) = match editing {
        Some(id) => {
            let path = format!("/admin/resources/{}/edit", id);
            (path.clone(), path)
        }
        None => ("/admin/resources/new".to_string(), "/admin/resources/new".to_string()),
    };

    let mut context = admin_context(session, &NoticeQuery::default());
    context.insert("form", form);
    context.insert("categories", &RESOURCE_CATEGORIES);
    context.insert("editing", &editing.is_some());
    context.insert("action", &action);
    context.insert("error", &error);
    state.render("admin/resource_form.html", &context, &path)
}

/// GET /admin/resources
pub async fn resources(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, PageError> {
    let mut context = admin_context(&session, &query);
    match state.resource_service.list_all(&session).await {
        Ok(resources) => context.insert("resources", &resources),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load resources");
            context.insert("resources", &Vec::<()>::new());
            context.insert("error", &e.to_string());
        }
    }
    state.render("admin/resources.html", &context, "/admin/resources")
}

/// GET /admin/resources/new
pub async fn new_resource(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<Html<String>, PageError> {
    render_resource_form(&state, &session, &ResourceFormView::default(), None, None)
}

/// POST /admin/resources/new
pub async fn create_resource(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    multipart: Multipart,
) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(message) => {
            return render_resource_form(&state, &session, &ResourceFormView::default(), None, Some(&message))
                .into_response()
        }
    };

    let view = ResourceFormView::from_form(&form);
    match state.resource_service.create(&session, resource_input(form)).await {
        Ok(_) => redirect_with_notice("/admin/resources", "Resource created successfully").into_response(),
        Err(e) => render_resource_form(&state, &session, &view, None, Some(&e.to_string())).into_response(),
    }
}

/// GET /admin/resources/{id}/edit
pub async fn edit_resource(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
) -> Result<Html<String>, PageError> {
    let path = format!("/admin/resources/{}/edit", id);
    let id = parse_id(&id).ok_or_else(|| state.not_found(&path))?;

    match state.resource_service.get(&session, id).await {
        Ok(resource) => render_resource_form(&state, &session, &ResourceFormView::from(&resource), Some(id), None),
        Err(ResourceServiceError::NotFound) => Err(state.not_found(&path)),
        Err(e) => Err(state.error_page(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), &path)),
    }
}

/// POST /admin/resources/{id}/edit
pub async fn update_resource(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return state.not_found(&format!("/admin/resources/{}/edit", id)).into_response();
    };

    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(message) => {
            return render_resource_form(&state, &session, &ResourceFormView::default(), Some(id), Some(&message))
                .into_response()
        }
    };

    let view = ResourceFormView::from_form(&form);
    match state.resource_service.update(&session, id, resource_input(form)).await {
        Ok(_) => redirect_with_notice("/admin/resources", "Resource updated successfully").into_response(),
        Err(e) => render_resource_form(&state, &session, &view, Some(id), Some(&e.to_string())).into_response(),
    }
}

/// POST /admin/resources/{id}/delete
pub async fn delete_resource(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
) -> Redirect {
    let Some(id) = parse_id(&id) else {
        return redirect_with_error("/admin/resources", "Resource not found");
    };
    match state.resource_service.delete(&session, id).await {
        Ok(()) => redirect_with_notice("/admin/resources", "Resource deleted successfully"),
        Err(e) => redirect_with_error("/admin/resources", &e.to_string()),
    }
}

/// POST /admin/resources/{id}/toggle-publish
pub async fn toggle_resource(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
) -> Redirect {
    let Some(id) = parse_id(&id) else {
        return redirect_with_error("/admin/resources", "Resource not found");
    };
    match state.resource_service.toggle_publish(&session, id).await {
        Ok(resource) if resource.published => redirect_with_notice("/admin/resources", "Resource published"),
        Ok(_) => redirect_with_notice("/admin/resources", "Resource unpublished"),
        Err(e) => redirect_with_error("/admin/resources", &e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Community posts
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PostFormView {
    title: String,
    content: String,
    link_url: String,
    image_url: String,
    published: bool,
}

impl Default for PostFormView {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            link_url: String::new(),
            image_url: String::new(),
            published: true,
        }
    }
}

impl PostFormView {
    fn from_form(form: &FormData) -> Self {
        Self {
            title: form.text("title"),
            content: form.text("content"),
            link_url: form.text("link_url"),
            image_url: form.text("image_url"),
            published: checkbox(form.get("published")),
        }
    }
}

fn post_input(form: FormData) -> PostInput {
    PostInput {
        title: form.text("title"),
        content: form.text("content"),
        link_url: non_empty(form.get("link_url").map(str::to_string)),
        published: checkbox(form.get("published")),
        image: ImageInput {
            url: non_empty(form.get("image_url").map(str::to_string)),
            upload: form.image,
        },
    }
}

fn render_post_form(
    state: &AppState,
    session: &AdminSession,
    form: &PostFormView,
    error: Option<&str>,
) -> Result<Html<String>, PageError> {
    let mut context = admin_context(session, &NoticeQuery::default());
    context.insert("form", form);
    context.insert("error", &error);
    state.render("admin/post_form.html", &context, "/admin/community/new")
}

/// A post row with the flags the card list shows
#[derive(Serialize)]
struct PostRow<'a> {
    #[serde(flatten)]
    post: &'a CommunityPost,
    has_link: bool,
    has_image: bool,
}

fn post_rows(posts: &[CommunityPost]) -> Vec<PostRow<'_>> {
    posts
        .iter()
        .map(|post| PostRow {
            has_link: post.link_url.is_some(),
            has_image: post.image_url.is_some(),
            post,
        })
        .collect()
}

async fn render_post_list(
    state: &AppState,
    session: &AdminSession,
    query: &NoticeQuery,
    template: &str,
    path: &str,
) -> Result<Html<String>, PageError> {
    let mut context = admin_context(session, query);
    match state.community_service.list_all(session).await {
        Ok(posts) => context.insert("posts", &post_rows(&posts)),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load community posts");
            context.insert("posts", &Vec::<()>::new());
            context.insert("error", &e.to_string());
        }
    }
    state.render(template, &context, path)
}

/// GET /admin/community
pub async fn community(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, PageError> {
    render_post_list(&state, &session, &query, "admin/community.html", "/admin/community").await
}

/// GET /admin/community/new
pub async fn new_post(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<Html<String>, PageError> {
    render_post_form(&state, &session, &PostFormView::default(), None)
}

/// POST /admin/community/new
pub async fn create_post(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    multipart: Multipart,
) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(message) => {
            return render_post_form(&state, &session, &PostFormView::default(), Some(&message)).into_response()
        }
    };

    let view = PostFormView::from_form(&form);
    match state.community_service.create(&session, post_input(form)).await {
        Ok(_) => redirect_with_notice("/admin/community", "Post created successfully").into_response(),
        Err(e) => render_post_form(&state, &session, &view, Some(&e.to_string())).into_response(),
    }
}

/// GET /admin/posts
pub async fn posts(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, PageError> {
    render_post_list(&state, &session, &query, "admin/posts.html", "/admin/posts").await
}

/// Post edit form fields
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PostEditForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

fn render_post_edit(
    state: &AppState,
    session: &AdminSession,
    id: Uuid,
    form: &PostEditForm,
    error: Option<&str>,
) -> Result<Html<String>, PageError> {
    let path = format!("/admin/posts/{}/edit", id);
    let mut context = admin_context(session, &NoticeQuery::default());
    context.insert("id", &id);
    context.insert("form", form);
    context.insert("error", &error);
    state.render("admin/post_edit.html", &context, &path)
}

/// GET /admin/posts/{id}/edit
pub async fn edit_post(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
) -> Result<Html<String>, PageError> {
    let path = format!("/admin/posts/{}/edit", id);
    let id = parse_id(&id).ok_or_else(|| state.not_found(&path))?;

    match state.community_service.get(&session, id).await {
        Ok(post) => {
            let form = PostEditForm {
                title: post.title,
                content: post.content,
            };
            render_post_edit(&state, &session, id, &form, None)
        }
        Err(CommunityServiceError::NotFound) => Err(state.not_found(&path)),
        Err(e) => Err(state.error_page(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), &path)),
    }
}

/// POST /admin/posts/{id}/edit
pub async fn update_post(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
    Form(form): Form<PostEditForm>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return state.not_found(&format!("/admin/posts/{}/edit", id)).into_response();
    };

    let edit = PostEdit {
        title: form.title.clone(),
        content: form.content.clone(),
    };
    match state.community_service.update(&session, id, edit).await {
        Ok(_) => redirect_with_notice("/admin/posts", "Post updated successfully").into_response(),
        Err(e) => render_post_edit(&state, &session, id, &form, Some(&e.to_string())).into_response(),
    }
}

/// POST /admin/posts/{id}/delete
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
) -> Redirect {
    let Some(id) = parse_id(&id) else {
        return redirect_with_error("/admin/posts", "Post not found");
    };
    match state.community_service.delete(&session, id).await {
        Ok(()) => redirect_with_notice("/admin/posts", "Post deleted successfully"),
        Err(e) => redirect_with_error("/admin/posts", &e.to_string()),
    }
}

/// POST /admin/posts/{id}/toggle-publish
pub async fn toggle_post(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
) -> Redirect {
    let Some(id) = parse_id(&id) else {
        return redirect_with_error("/admin/posts", "Post not found");
    };
    match state.community_service.toggle_publish(&session, id).await {
        Ok(post) if post.published => redirect_with_notice("/admin/posts", "Post published"),
        Ok(_) => redirect_with_notice("/admin/posts", "Post unpublished"),
        Err(e) => redirect_with_error("/admin/posts", &e.to_string()),
    }
}
