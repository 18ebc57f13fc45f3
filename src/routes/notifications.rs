use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::NotificationResponse;
use crate::security::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/unread_count", get(unread_count))
        .route("/notifications/{notification_id}/read", post(mark_read))
        .route("/notifications/{notification_id}", delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    Ok(Json(state.notifications.list(user.id).await?))
}

async fn unread_count(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let unread = state.notifications.unread_count(user.id).await?;
    Ok(Json(json!({ "unread": unread })))
}

async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<NotificationResponse>, AppError> {
    Ok(Json(
        state.notifications.mark_read(user.id, notification_id).await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.notifications.delete(user.id, notification_id).await?;
    Ok(Json(json!({ "success": true })))
}
