//! Notification feed: read, mark-as-read, dismiss.
//!
//! Rows are created and removed by the interaction service; this module
//! only reads and mutates recipient-owned state. Enrichment (actor name and
//! photo, article title and thumbnail) is a live join at read time.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{NotificationRecord, NotificationResponse};

const FEED_SELECT: &str = "SELECT n.id, n.user_id, n.actor_id, n.type, n.article_id, \
     n.comment_id, n.reaction_type, n.is_read, n.created_at, \
     au.username AS actor_username, au.photo_url AS actor_photo_url, \
     a.title AS article_title, a.image_url AS article_thumbnail_url \
     FROM notifications n \
     LEFT JOIN users au ON au.id = n.actor_id \
     LEFT JOIN articles a ON a.id = n.article_id";

#[derive(Clone)]
pub struct NotificationService {
    pool: SqlitePool,
}

impl NotificationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The recipient's notifications, newest first.
    pub async fn list(&self, user_id: i64) -> Result<Vec<NotificationResponse>, AppError> {
        let records: Vec<NotificationRecord> = sqlx::query_as(&format!(
            "{FEED_SELECT} WHERE n.user_id = ? ORDER BY n.created_at DESC, n.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records
            .into_iter()
            .map(NotificationRecord::into_response)
            .collect())
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn mark_read(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<NotificationResponse, AppError> {
        self.require_recipient(user_id, notification_id).await?;
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        let record: NotificationRecord =
            sqlx::query_as(&format!("{FEED_SELECT} WHERE n.id = ?"))
                .bind(notification_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(record.into_response())
    }

    pub async fn delete(&self, user_id: i64, notification_id: i64) -> Result<(), AppError> {
        self.require_recipient(user_id, notification_id).await?;
        sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Non-recipients get a 404, not a 403, so notification ids are not
    /// probeable.
    async fn require_recipient(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<(), AppError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT user_id FROM notifications WHERE id = ?")
                .bind(notification_id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((recipient,)) if recipient == user_id => Ok(()),
            _ => Err(AppError::NotFound("notification not found".into())),
        }
    }
}
