//! Toggle semantics for favorites and reactions, with their notification
//! side effects.
//!
//! Every mutation runs inside a single transaction: the favorite/reaction
//! row and the matching notification row change together or not at all.
//! Notification de-duplication is an atomic upsert backed by partial unique
//! indexes, so at most one live notification exists per
//! (recipient, actor, type, target) even under concurrent toggles.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::{NotificationKind, ReactionCounts, ReactionKind, ReactionState};

/// Outcome of a favorite toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FavoriteToggle {
    Added,
    Removed,
}

#[derive(Clone)]
pub struct InteractionService {
    pool: SqlitePool,
}

impl InteractionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Toggle a favorite for (user, article).
    ///
    /// Present: remove it and the matching notification. Absent: create it
    /// and notify the article owner, unless the caller owns the article.
    pub async fn toggle_favorite(
        &self,
        user_id: i64,
        article_id: i64,
    ) -> Result<FavoriteToggle, AppError> {
        let mut tx = self.pool.begin().await?;
        let owner_id = article_owner(&mut tx, article_id).await?;

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM favorites WHERE user_id = ? AND article_id = ?")
                .bind(user_id)
                .bind(article_id)
                .fetch_optional(&mut *tx)
                .await?;

        let outcome = match existing {
            Some((favorite_id,)) => {
                sqlx::query("DELETE FROM favorites WHERE id = ?")
                    .bind(favorite_id)
                    .execute(&mut *tx)
                    .await?;
                delete_article_notification(
                    &mut tx,
                    owner_id,
                    user_id,
                    NotificationKind::Favorite,
                    article_id,
                )
                .await?;
                FavoriteToggle::Removed
            }
            None => {
                sqlx::query("INSERT INTO favorites (user_id, article_id) VALUES (?, ?)")
                    .bind(user_id)
                    .bind(article_id)
                    .execute(&mut *tx)
                    .await?;
                if owner_id != user_id {
                    upsert_article_notification(
                        &mut tx,
                        owner_id,
                        user_id,
                        NotificationKind::Favorite,
                        article_id,
                        None,
                    )
                    .await?;
                }
                FavoriteToggle::Added
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Tri-state reaction toggle on an article.
    ///
    /// No existing reaction: create. Same type: remove (un-react).
    /// Different type: switch in place. At most one reaction row exists per
    /// (article, user) at any point. Returns the post-mutation counts and
    /// the caller's now-current reaction.
    pub async fn toggle_article_reaction(
        &self,
        user_id: i64,
        article_id: i64,
        kind: ReactionKind,
    ) -> Result<ReactionState, AppError> {
        let mut tx = self.pool.begin().await?;
        let owner_id = article_owner(&mut tx, article_id).await?;

        let existing: Option<(i64, String)> =
            sqlx::query_as("SELECT id, type FROM reactions WHERE article_id = ? AND user_id = ?")
                .bind(article_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let user_reaction = match existing {
            None => {
                sqlx::query(
                    "INSERT INTO reactions (article_id, user_id, type, created_at) \
                     VALUES (?, ?, ?, ?)",
                )
                .bind(article_id)
                .bind(user_id)
                .bind(kind.as_str())
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
                if owner_id != user_id {
                    upsert_article_notification(
                        &mut tx,
                        owner_id,
                        user_id,
                        NotificationKind::ReactionArticle,
                        article_id,
                        Some(kind),
                    )
                    .await?;
                }
                Some(kind)
            }
            Some((reaction_id, current)) if current == kind.as_str() => {
                sqlx::query("DELETE FROM reactions WHERE id = ?")
                    .bind(reaction_id)
                    .execute(&mut *tx)
                    .await?;
                delete_article_notification(
                    &mut tx,
                    owner_id,
                    user_id,
                    NotificationKind::ReactionArticle,
                    article_id,
                )
                .await?;
                None
            }
            Some((reaction_id, _)) => {
                sqlx::query("UPDATE reactions SET type = ? WHERE id = ?")
                    .bind(kind.as_str())
                    .bind(reaction_id)
                    .execute(&mut *tx)
                    .await?;
                if owner_id != user_id {
                    upsert_article_notification(
                        &mut tx,
                        owner_id,
                        user_id,
                        NotificationKind::ReactionArticle,
                        article_id,
                        Some(kind),
                    )
                    .await?;
                }
                Some(kind)
            }
        };

        let counts = article_reaction_counts(&mut tx, article_id).await?;
        tx.commit().await?;
        Ok(ReactionState {
            counts,
            user_reaction,
        })
    }

    /// Tri-state reaction toggle on a comment; notifies the comment author.
    pub async fn toggle_comment_reaction(
        &self,
        user_id: i64,
        article_id: i64,
        comment_id: i64,
        kind: ReactionKind,
    ) -> Result<ReactionState, AppError> {
        let mut tx = self.pool.begin().await?;
        let author_id = comment_author(&mut tx, article_id, comment_id).await?;

        let existing: Option<(i64, String)> = sqlx::query_as(
            "SELECT id, type FROM comment_reactions WHERE comment_id = ? AND user_id = ?",
        )
        .bind(comment_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let user_reaction = match existing {
            None => {
                sqlx::query(
                    "INSERT INTO comment_reactions (comment_id, user_id, type, created_at) \
                     VALUES (?, ?, ?, ?)",
                )
                .bind(comment_id)
                .bind(user_id)
                .bind(kind.as_str())
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
                if let Some(author) = author_id.filter(|a| *a != user_id) {
                    upsert_comment_notification(
                        &mut tx, author, user_id, comment_id, article_id, kind,
                    )
                    .await?;
                }
                Some(kind)
            }
            Some((reaction_id, current)) if current == kind.as_str() => {
                sqlx::query("DELETE FROM comment_reactions WHERE id = ?")
                    .bind(reaction_id)
                    .execute(&mut *tx)
                    .await?;
                if let Some(author) = author_id {
                    delete_comment_notification(&mut tx, author, user_id, comment_id).await?;
                }
                None
            }
            Some((reaction_id, _)) => {
                sqlx::query("UPDATE comment_reactions SET type = ? WHERE id = ?")
                    .bind(kind.as_str())
                    .bind(reaction_id)
                    .execute(&mut *tx)
                    .await?;
                if let Some(author) = author_id.filter(|a| *a != user_id) {
                    upsert_comment_notification(
                        &mut tx, author, user_id, comment_id, article_id, kind,
                    )
                    .await?;
                }
                Some(kind)
            }
        };

        let counts = comment_reaction_counts(&mut tx, comment_id).await?;
        tx.commit().await?;
        Ok(ReactionState {
            counts,
            user_reaction,
        })
    }

    /// Read-only reaction state for an article.
    pub async fn article_reaction_state(
        &self,
        article_id: i64,
        viewer: Option<i64>,
    ) -> Result<ReactionState, AppError> {
        let mut conn = self.pool.acquire().await?;
        let counts = article_reaction_counts(&mut conn, article_id).await?;
        let user_reaction = match viewer {
            Some(user_id) => current_reaction(
                &mut conn,
                "SELECT type FROM reactions WHERE article_id = ? AND user_id = ?",
                article_id,
                user_id,
            )
            .await?,
            None => None,
        };
        Ok(ReactionState {
            counts,
            user_reaction,
        })
    }

    /// Read-only reaction state for a comment; the comment must belong to
    /// the given article.
    pub async fn comment_reaction_state(
        &self,
        article_id: i64,
        comment_id: i64,
        viewer: Option<i64>,
    ) -> Result<ReactionState, AppError> {
        let mut conn = self.pool.acquire().await?;
        comment_author(&mut conn, article_id, comment_id).await?;
        let counts = comment_reaction_counts(&mut conn, comment_id).await?;
        let user_reaction = match viewer {
            Some(user_id) => current_reaction(
                &mut conn,
                "SELECT type FROM comment_reactions WHERE comment_id = ? AND user_id = ?",
                comment_id,
                user_id,
            )
            .await?,
            None => None,
        };
        Ok(ReactionState {
            counts,
            user_reaction,
        })
    }
}

async fn article_owner(
    conn: &mut SqliteConnection,
    article_id: i64,
) -> Result<i64, AppError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM articles WHERE id = ?")
        .bind(article_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|(owner,)| owner)
        .ok_or_else(|| AppError::NotFound("article not found".into()))
}

/// Returns the comment's author (nullable), or `NotFound` when the comment
/// does not exist or belongs to a different article.
async fn comment_author(
    conn: &mut SqliteConnection,
    article_id: i64,
    comment_id: i64,
) -> Result<Option<i64>, AppError> {
    let row: Option<(i64, Option<i64>)> =
        sqlx::query_as("SELECT article_id, user_id FROM comments WHERE id = ?")
            .bind(comment_id)
            .fetch_optional(&mut *conn)
            .await?;
    match row {
        Some((owning_article, author)) if owning_article == article_id => Ok(author),
        _ => Err(AppError::NotFound("comment not found".into())),
    }
}

async fn article_reaction_counts(
    conn: &mut SqliteConnection,
    article_id: i64,
) -> Result<ReactionCounts, AppError> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT type, COUNT(*) FROM reactions WHERE article_id = ? GROUP BY type")
            .bind(article_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(fold_counts(rows))
}

async fn comment_reaction_counts(
    conn: &mut SqliteConnection,
    comment_id: i64,
) -> Result<ReactionCounts, AppError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT type, COUNT(*) FROM comment_reactions WHERE comment_id = ? GROUP BY type",
    )
    .bind(comment_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(fold_counts(rows))
}

fn fold_counts(rows: Vec<(String, i64)>) -> ReactionCounts {
    let mut counts = ReactionCounts::default();
    for (kind, count) in rows {
        if let Ok(kind) = ReactionKind::parse(&kind) {
            counts.set(kind, count);
        }
    }
    counts
}

async fn current_reaction(
    conn: &mut SqliteConnection,
    query: &str,
    target_id: i64,
    user_id: i64,
) -> Result<Option<ReactionKind>, AppError> {
    let row: Option<(String,)> = sqlx::query_as(query)
        .bind(target_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.and_then(|(kind,)| ReactionKind::parse(&kind).ok()))
}

async fn upsert_article_notification(
    conn: &mut SqliteConnection,
    recipient: i64,
    actor: i64,
    kind: NotificationKind,
    article_id: i64,
    reaction: Option<ReactionKind>,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO notifications \
             (user_id, actor_id, type, article_id, reaction_type, is_read, created_at) \
         VALUES (?, ?, ?, ?, ?, 0, ?) \
         ON CONFLICT (user_id, actor_id, type, article_id) WHERE comment_id IS NULL \
         DO UPDATE SET reaction_type = excluded.reaction_type, \
                       is_read = 0, \
                       created_at = excluded.created_at",
    )
    .bind(recipient)
    .bind(actor)
    .bind(kind.as_str())
    .bind(article_id)
    .bind(reaction.map(ReactionKind::as_str))
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

/// Comment notifications carry the article id for display context.
async fn upsert_comment_notification(
    conn: &mut SqliteConnection,
    recipient: i64,
    actor: i64,
    comment_id: i64,
    article_id: i64,
    reaction: ReactionKind,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO notifications \
             (user_id, actor_id, type, article_id, comment_id, reaction_type, is_read, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, 0, ?) \
         ON CONFLICT (user_id, actor_id, type, comment_id) WHERE comment_id IS NOT NULL \
         DO UPDATE SET reaction_type = excluded.reaction_type, \
                       article_id = excluded.article_id, \
                       is_read = 0, \
                       created_at = excluded.created_at",
    )
    .bind(recipient)
    .bind(actor)
    .bind(NotificationKind::ReactionComment.as_str())
    .bind(article_id)
    .bind(comment_id)
    .bind(reaction.as_str())
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

async fn delete_article_notification(
    conn: &mut SqliteConnection,
    recipient: i64,
    actor: i64,
    kind: NotificationKind,
    article_id: i64,
) -> Result<(), AppError> {
    sqlx::query(
        "DELETE FROM notifications \
         WHERE user_id = ? AND actor_id = ? AND type = ? AND article_id = ? \
           AND comment_id IS NULL",
    )
    .bind(recipient)
    .bind(actor)
    .bind(kind.as_str())
    .bind(article_id)
    .execute(conn)
    .await?;
    Ok(())
}

async fn delete_comment_notification(
    conn: &mut SqliteConnection,
    recipient: i64,
    actor: i64,
    comment_id: i64,
) -> Result<(), AppError> {
    sqlx::query(
        "DELETE FROM notifications \
         WHERE user_id = ? AND actor_id = ? AND type = ? AND comment_id = ?",
    )
    .bind(recipient)
    .bind(actor)
    .bind(NotificationKind::ReactionComment.as_str())
    .bind(comment_id)
    .execute(conn)
    .await?;
    Ok(())
}
