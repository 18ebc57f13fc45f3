use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::{ArticleResponse, ReactionKind, ReactionRequest, ReactionState};
use crate::security::CurrentUser;
use crate::services::interactions::FavoriteToggle;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list_favorites))
        .route("/favorites/{article_id}", post(toggle_favorite))
        .route(
            "/article/{article_id}/reactions",
            get(get_reactions).post(toggle_reaction),
        )
        .route(
            "/article/{article_id}/comments/{comment_id}/reactions",
            get(get_comment_reactions).post(toggle_comment_reaction),
        )
}

async fn toggle_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i64>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    match state.interactions.toggle_favorite(user.id, article_id).await? {
        FavoriteToggle::Added => Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "favorite added" })),
        )),
        FavoriteToggle::Removed => Ok((
            StatusCode::OK,
            Json(json!({ "message": "favorite removed" })),
        )),
    }
}

async fn list_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ArticleResponse>>, AppError> {
    Ok(Json(state.articles.favorites_of(user.id).await?))
}

async fn get_reactions(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(article_id): Path<i64>,
) -> Result<Json<ReactionState>, AppError> {
    let viewer = user.map(|u| u.id);
    Ok(Json(
        state
            .interactions
            .article_reaction_state(article_id, viewer)
            .await?,
    ))
}

async fn toggle_reaction(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i64>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<ReactionState>, AppError> {
    let kind = ReactionKind::parse(&body.kind)?;
    Ok(Json(
        state
            .interactions
            .toggle_article_reaction(user.id, article_id, kind)
            .await?,
    ))
}

async fn get_comment_reactions(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path((article_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<ReactionState>, AppError> {
    let viewer = user.map(|u| u.id);
    Ok(Json(
        state
            .interactions
            .comment_reaction_state(article_id, comment_id, viewer)
            .await?,
    ))
}

async fn toggle_comment_reaction(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((article_id, comment_id)): Path<(i64, i64)>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<ReactionState>, AppError> {
    let kind = ReactionKind::parse(&body.kind)?;
    Ok(Json(
        state
            .interactions
            .toggle_comment_reaction(user.id, article_id, comment_id, kind)
            .await?,
    ))
}
