use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

// --- Reaction and notification enums ---

/// The closed set of reaction types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Laugh,
    Heart,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Laugh => "laugh",
            ReactionKind::Heart => "heart",
        }
    }

    /// Parse a client-supplied reaction type, rejecting anything outside the
    /// known set before any lookup happens.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "laugh" => Ok(ReactionKind::Laugh),
            "heart" => Ok(ReactionKind::Heart),
            other => Err(AppError::BadRequest(format!(
                "invalid reaction type '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Favorite,
    ReactionArticle,
    ReactionComment,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Favorite => "favorite",
            NotificationKind::ReactionArticle => "reaction_article",
            NotificationKind::ReactionComment => "reaction_comment",
        }
    }
}

// --- Entities ---

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub area: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub article_id: i64,
    pub user_id: Option<i64>,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Article row joined with its author's current username and photo.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ArticleRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub pdf_url: Option<String>,
    pub video_url: Option<String>,
    pub tag: Option<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub author: Option<String>,
    pub author_photo_url: Option<String>,
}

impl ArticleRecord {
    pub fn into_response(self, is_favorite: bool) -> ArticleResponse {
        ArticleResponse {
            id: self.id,
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            pdf_url: self.pdf_url,
            video_url: self.video_url,
            tag: self.tag,
            author: self.author,
            author_photo_url: self.author_photo_url,
            created_at: self.created_at.format("%d-%m-%Y").to_string(),
            user_id: self.user_id,
            is_favorite,
        }
    }
}

/// Notification row enriched at read time with the actor's current
/// username/photo and the referenced article's current title/thumbnail.
/// This is a live join by design, unlike the comment username snapshot.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct NotificationRecord {
    pub id: i64,
    pub user_id: i64,
    pub actor_id: Option<i64>,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub article_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub reaction_type: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub actor_username: Option<String>,
    #[sqlx(default)]
    pub actor_photo_url: Option<String>,
    #[sqlx(default)]
    pub article_title: Option<String>,
    #[sqlx(default)]
    pub article_thumbnail_url: Option<String>,
}

impl NotificationRecord {
    pub fn into_response(self) -> NotificationResponse {
        NotificationResponse {
            id: self.id,
            user_id: self.user_id,
            actor_id: self.actor_id,
            kind: self.kind,
            article_id: self.article_id,
            comment_id: self.comment_id,
            reaction_type: self.reaction_type,
            is_read: self.is_read,
            created_at: self.created_at.format("%d-%m-%Y %H:%M:%S").to_string(),
            actor_username: self.actor_username,
            actor_photo_url: self.actor_photo_url,
            article_title: self.article_title,
            article_thumbnail_url: self.article_thumbnail_url,
        }
    }
}

// --- Request bodies ---

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "username must be 1-50 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub area: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    pub image_url: Option<String>,
    pub pdf_url: Option<String>,
    pub video_url: Option<String>,
    #[validate(length(max = 150, message = "tag must be at most 150 characters"))]
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub pdf_url: Option<String>,
    pub video_url: Option<String>,
    #[validate(length(max = 150, message = "tag must be at most 150 characters"))]
    pub tag: Option<String>,
}

/// Optional search/filter parameters for the article listing.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleFilter {
    pub q: Option<String>,
    pub tag: Option<String>,
    pub tag_slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// Reaction type arrives as a raw string and is validated against the known
/// enum before any database access.
#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageIn {
    pub role: String,
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessageIn>,
}

// --- Response bodies ---

#[derive(Clone, Debug, Serialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub pdf_url: Option<String>,
    pub video_url: Option<String>,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub author_photo_url: Option<String>,
    pub created_at: String,
    pub user_id: i64,
    pub is_favorite: bool,
}

/// Per-type reaction counts. All three known types are always present,
/// even when zero.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ReactionCounts {
    pub like: i64,
    pub laugh: i64,
    pub heart: i64,
}

impl ReactionCounts {
    pub fn set(&mut self, kind: ReactionKind, count: i64) {
        match kind {
            ReactionKind::Like => self.like = count,
            ReactionKind::Laugh => self.laugh = count,
            ReactionKind::Heart => self.heart = count,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ReactionState {
    pub counts: ReactionCounts,
    pub user_reaction: Option<ReactionKind>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub user_id: i64,
    pub actor_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub article_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub reaction_type: Option<String>,
    pub is_read: bool,
    pub created_at: String,
    pub actor_username: Option<String>,
    pub actor_photo_url: Option<String>,
    pub article_title: Option<String>,
    pub article_thumbnail_url: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub area: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}
