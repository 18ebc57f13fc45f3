use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::{Comment, CommentRequest};
use crate::security::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/article/{article_id}/comments", get(list).post(create))
        .route(
            "/article/{article_id}/comments/{comment_id}",
            axum::routing::put(update).delete(remove),
        )
}

async fn list(
    State(state): State<AppState>,
    Path(article_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, AppError> {
    Ok(Json(state.comments.list(article_id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i64>,
    Json(body): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let comment = state
        .comments
        .create(user.id, &user.username, article_id, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((article_id, comment_id)): Path<(i64, i64)>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<Comment>, AppError> {
    let comment = state
        .comments
        .update(user.id, article_id, comment_id, &body.text)
        .await?;
    Ok(Json(comment))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((article_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<Value>, AppError> {
    state.comments.delete(user.id, article_id, comment_id).await?;
    Ok(Json(json!({ "success": true })))
}
