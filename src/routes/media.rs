//! Remote media proxying and PDF uploads.

use std::collections::HashMap;
use std::path::Path as FsPath;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::AppError;
use crate::security::CurrentUser;
use crate::state::AppState;

const PROXY_TIMEOUT: Duration = Duration::from_secs(15);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/proxy", get(proxy))
        .route("/article/{article_id}/upload_pdf", post(upload_pdf))
}

/// Stream a remote resource through the server, mainly so PDFs hosted
/// elsewhere can be rendered inline without CORS trouble. The client's
/// `Range` header is forwarded and the upstream status mirrored, so video
/// players can seek through partial-content responses.
async fn proxy(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    request_headers: HeaderMap,
) -> Result<Response, AppError> {
    let url = params
        .get("url")
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing url parameter".into()))?;

    let mut request = state.http.get(url).timeout(PROXY_TIMEOUT);
    if let Some(range) = request_headers.get(header::RANGE) {
        request = request.header(header::RANGE, range.clone());
    }
    let upstream = request.send().await.map_err(|e| {
        warn!(url, error = %e, "proxy fetch failed");
        AppError::Upstream("failed to fetch remote resource".into())
    })?;
    let status = upstream.status();
    if status.as_u16() >= 400 {
        warn!(url, status = %status, "proxy upstream returned an error");
        return Err(AppError::Upstream("failed to fetch remote resource".into()));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_owned();
    let is_pdf = content_type.contains("pdf") || url.to_lowercase().ends_with(".pdf");

    let mut headers = HeaderMap::new();
    if is_pdf {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/pdf"),
        );
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("inline"),
        );
    } else if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    for name in [header::CONTENT_RANGE, header::ACCEPT_RANGES] {
        if let Some(value) = upstream.headers().get(&name) {
            headers.insert(name, value.clone());
        }
    }

    let mut response = Response::builder().status(status);
    if let Some(h) = response.headers_mut() {
        h.extend(headers);
    }
    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::Internal(format!("proxy response build failed: {e}")))
}

/// Store an uploaded PDF under the static tree and attach it to an article
/// the caller owns. A first-page thumbnail is generated when possible.
async fn upload_pdf(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let owner = state.articles.owner_of(article_id).await?;
    if owner != user.id {
        return Err(AppError::Forbidden(
            "not authorized to attach files to this article".into(),
        ));
    }

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.pdf").to_owned();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
        upload = Some((filename, data.to_vec()));
        break;
    }
    let (filename, data) = upload
        .ok_or_else(|| AppError::BadRequest("missing file field".into()))?;
    if !data.starts_with(b"%PDF") {
        return Err(AppError::BadRequest("uploaded file is not a PDF".into()));
    }

    let filename = sanitize_filename(&filename);
    let dir = FsPath::new(&state.config.static_dir).join("uploads/pdfs");
    tokio::fs::create_dir_all(&dir).await?;
    let stored_name = format!("{article_id}_{filename}");
    tokio::fs::write(dir.join(&stored_name), &data).await?;

    let pdf_url = format!("/static/uploads/pdfs/{stored_name}");
    state.articles.set_pdf_url(article_id, &pdf_url).await?;

    let image_url = state.thumbnails.thumbnail_from_bytes(&data);
    if let Some(ref url) = image_url {
        state.articles.set_image_url(article_id, url).await?;
    }

    Ok(Json(json!({ "pdf_url": pdf_url, "image_url": image_url })))
}

/// Keep only characters safe for a filesystem path component.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['_', '.']).is_empty() {
        "upload.pdf".to_owned()
    } else {
        cleaned
    }
}
