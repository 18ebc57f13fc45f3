use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::error::AppError;
use crate::models::{ChatReply, ChatRequest};
use crate::security::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}

async fn chat(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state.chat.complete(body).await?;
    Ok(Json(ChatReply { reply }))
}
