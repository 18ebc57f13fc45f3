use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    ArticleResponse, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest,
    UserProfile,
};
use crate::security::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/check-auth", get(check_auth))
        .route("/user/profile", get(profile).put(update_profile))
        .route("/user/{user_id}", get(public_profile))
        .route("/user/{user_id}/articles", get(user_articles))
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    body.validate()?;
    let message = state.auth.register(body).await?;
    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(state.auth.login(body).await?))
}

async fn check_auth(user: Option<CurrentUser>) -> (StatusCode, Json<Value>) {
    match user {
        Some(user) => (
            StatusCode::OK,
            Json(json!({
                "authenticated": true,
                "username": user.username,
                "user_id": user.id,
            })),
        ),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        ),
    }
}

async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.auth.profile(user.id).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    state.auth.update_profile(user.id, body).await?;
    Ok(Json(json!({ "message": "profile updated" })))
}

async fn public_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.auth.public_profile(user_id).await?))
}

async fn user_articles(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<ArticleResponse>>, AppError> {
    Ok(Json(state.articles.list_by_author(user_id).await?))
}
