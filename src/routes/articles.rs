use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    ArticleFilter, ArticleResponse, CreateArticleRequest, UpdateArticleRequest,
};
use crate::security::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list).post(create))
        .route("/articles/{article_id}", axum::routing::put(update).delete(remove))
        .route("/article/{article_id}", get(get_one))
}

async fn list(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Query(filter): Query<ArticleFilter>,
) -> Result<Json<Vec<ArticleResponse>>, AppError> {
    let viewer = user.map(|u| u.id);
    Ok(Json(state.articles.list(&filter, viewer).await?))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ArticleResponse>), AppError> {
    body.validate()?;
    let article = state.articles.create(user.id, body).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

async fn get_one(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(article_id): Path<i64>,
) -> Result<Json<ArticleResponse>, AppError> {
    let viewer = user.map(|u| u.id);
    Ok(Json(state.articles.get(article_id, viewer).await?))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i64>,
    Json(body): Json<UpdateArticleRequest>,
) -> Result<Json<ArticleResponse>, AppError> {
    body.validate()?;
    Ok(Json(state.articles.update(user.id, article_id, body).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let message = state.articles.delete(user.id, article_id).await?;
    Ok(Json(json!({ "message": message })))
}
