//! Static serving of the built single-page app.
//!
//! Any path the dispatcher does not recognize as an API call lands here.
//! Paths whose extension appears in the fixed table are served as assets
//! with that content type; everything else gets `index.html` so client-side
//! routing works on deep links.

use std::path::{Component, Path, PathBuf};

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Extension → content type for the asset files the build emits.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("js", "application/javascript"),
    ("css", "text/css"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("eot", "application/vnd.ms-fontobject"),
];

fn content_type_for(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
}

/// Serves `request_path` from `static_dir`.
pub async fn serve(static_dir: &Path, request_path: &str) -> Response {
    // The app references assets under /web/ai/; they live at the build root.
    let trimmed = request_path
        .strip_prefix("/web/ai")
        .unwrap_or(request_path)
        .trim_start_matches('/');

    if let Some(content_type) = content_type_for(trimmed) {
        if let Some(file) = safe_join(static_dir, trimmed) {
            if let Ok(bytes) = tokio::fs::read(&file).await {
                return ([(header::CONTENT_TYPE, content_type)], bytes).into_response();
            }
        }
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    match tokio::fs::read(static_dir.join("index.html")).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(dir = %static_dir.display(), error = %e, "SPA build not found");
            (StatusCode::NOT_FOUND, "Frontend build not found").into_response()
        }
    }
}

/// Joins a request path onto the build dir, rejecting traversal components.
fn safe_join(base: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    if relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        Some(base.join(relative))
    } else {
        None
    }
}
