//! Static asset serving from the embedded `static/` folder

use axum::{
    body::Body,
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

/// Stylesheets, scripts and images shipped with the binary
#[derive(RustEmbed)]
#[folder = "static/"]
struct SiteAssets;

/// GET /static/{*path}
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let decoded = urlencoding::decode(&path).map(|p| p.into_owned()).unwrap_or(path);
    if decoded.split('/').any(|segment| segment == "..") {
        return StatusCode::NOT_FOUND.into_response();
    }

    match SiteAssets::get(&decoded) {
        Some(content) => build_response(&decoded, content.data.into_owned()),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn build_response(path: &str, data: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, get_content_type(path)),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        Body::from(data),
    )
        .into_response()
}

/// Content type from the file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(get_content_type("site.css"), "text/css");
        assert_eq!(get_content_type("js/admin.js"), "application/javascript");
        assert_eq!(get_content_type("logo.svg"), "image/svg+xml");
        assert_eq!(get_content_type("README"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_serves_embedded_stylesheet() {
        let response = serve_static(Path("site.css".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/css");
    }

    #[tokio::test]
    async fn test_missing_and_traversal_paths() {
        let response = serve_static(Path("nope.css".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = serve_static(Path("../Cargo.toml".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
