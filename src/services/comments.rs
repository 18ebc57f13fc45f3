//! Comment CRUD.
//!
//! A comment stores the author's username as a snapshot taken at creation
//! time, so renaming or deleting the account later does not rewrite the
//! thread. Existence and article membership are checked before ownership:
//! a comment under the wrong article is a 404, not a 403.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::Comment;

#[derive(Clone)]
pub struct CommentService {
    pool: SqlitePool,
}

impl CommentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, article_id: i64) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as(
            "SELECT * FROM comments WHERE article_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    pub async fn create(
        &self,
        user_id: i64,
        username: &str,
        article_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        let text = require_text(text)?;
        let article: Option<(i64,)> = sqlx::query_as("SELECT id FROM articles WHERE id = ?")
            .bind(article_id)
            .fetch_optional(&self.pool)
            .await?;
        if article.is_none() {
            return Err(AppError::NotFound("article not found".into()));
        }

        let result = sqlx::query(
            "INSERT INTO comments (article_id, user_id, username, text, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(article_id)
        .bind(user_id)
        .bind(username)
        .bind(text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.fetch(result.last_insert_rowid()).await
    }

    pub async fn update(
        &self,
        user_id: i64,
        article_id: i64,
        comment_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        let text = require_text(text)?;
        let comment = self.require_in_article(article_id, comment_id).await?;
        require_author(&comment, user_id)?;

        sqlx::query("UPDATE comments SET text = ?, updated_at = ? WHERE id = ?")
            .bind(text)
            .bind(Utc::now())
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        self.fetch(comment_id).await
    }

    pub async fn delete(
        &self,
        user_id: i64,
        article_id: i64,
        comment_id: i64,
    ) -> Result<(), AppError> {
        let comment = self.require_in_article(article_id, comment_id).await?;
        require_author(&comment, user_id)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM comment_reactions WHERE comment_id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM notifications WHERE comment_id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn fetch(&self, comment_id: i64) -> Result<Comment, AppError> {
        let comment: Option<Comment> = sqlx::query_as("SELECT * FROM comments WHERE id = ?")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;
        comment.ok_or_else(|| AppError::NotFound("comment not found".into()))
    }

    async fn require_in_article(
        &self,
        article_id: i64,
        comment_id: i64,
    ) -> Result<Comment, AppError> {
        let comment = self.fetch(comment_id).await?;
        if comment.article_id != article_id {
            return Err(AppError::NotFound("comment not found".into()));
        }
        Ok(comment)
    }
}

fn require_text(text: &str) -> Result<&str, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest("comment text is required".into()));
    }
    Ok(text)
}

fn require_author(comment: &Comment, user_id: i64) -> Result<(), AppError> {
    if comment.user_id != Some(user_id) {
        return Err(AppError::Forbidden(
            "only the author can modify this comment".into(),
        ));
    }
    Ok(())
}
