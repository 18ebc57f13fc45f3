//! Article CRUD, accent-insensitive search/filter, and favorites listing.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{
    ArticleFilter, ArticleRecord, ArticleResponse, CreateArticleRequest, UpdateArticleRequest,
};
use crate::normalize::{normalize, slugify};
use crate::services::thumbnail::ThumbnailService;

const ARTICLE_SELECT: &str = "SELECT a.id, a.title, a.content, a.image_url, a.pdf_url, \
     a.video_url, a.tag, a.user_id, a.created_at, \
     u.username AS author, u.photo_url AS author_photo_url \
     FROM articles a LEFT JOIN users u ON u.id = a.user_id";

#[derive(Clone)]
pub struct ArticleService {
    pool: SqlitePool,
    thumbnails: ThumbnailService,
}

impl ArticleService {
    pub fn new(pool: SqlitePool, thumbnails: ThumbnailService) -> Self {
        Self { pool, thumbnails }
    }

    pub async fn create(
        &self,
        user_id: i64,
        request: CreateArticleRequest,
    ) -> Result<ArticleResponse, AppError> {
        let result = sqlx::query(
            "INSERT INTO articles \
                 (title, content, image_url, pdf_url, video_url, tag, user_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.title)
        .bind(normalize_newlines(&request.content))
        .bind(&request.image_url)
        .bind(&request.pdf_url)
        .bind(&request.video_url)
        .bind(&request.tag)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let article_id = result.last_insert_rowid();
        self.generate_missing_thumbnail(article_id).await;
        let record = self.fetch(article_id).await?;
        Ok(record.into_response(false))
    }

    pub async fn get(
        &self,
        article_id: i64,
        viewer: Option<i64>,
    ) -> Result<ArticleResponse, AppError> {
        let record = self.fetch(article_id).await?;
        let is_favorite = match viewer {
            Some(user_id) => self.is_favorite(user_id, article_id).await?,
            None => false,
        };
        Ok(record.into_response(is_favorite))
    }

    pub async fn update(
        &self,
        user_id: i64,
        article_id: i64,
        request: UpdateArticleRequest,
    ) -> Result<ArticleResponse, AppError> {
        let record = self.fetch(article_id).await?;
        if record.user_id != user_id {
            return Err(AppError::Forbidden(
                "not authorized to edit this article".into(),
            ));
        }

        sqlx::query(
            "UPDATE articles SET title = ?, content = ?, image_url = ?, pdf_url = ?, \
                 video_url = ?, tag = ? \
             WHERE id = ?",
        )
        .bind(request.title.unwrap_or(record.title))
        .bind(
            request
                .content
                .map(|c| normalize_newlines(&c))
                .unwrap_or(record.content),
        )
        .bind(request.image_url.or(record.image_url))
        .bind(request.pdf_url.or(record.pdf_url))
        .bind(request.video_url.or(record.video_url))
        .bind(request.tag.or(record.tag))
        .bind(article_id)
        .execute(&self.pool)
        .await?;

        self.generate_missing_thumbnail(article_id).await;
        let record = self.fetch(article_id).await?;
        let is_favorite = self.is_favorite(user_id, article_id).await?;
        Ok(record.into_response(is_favorite))
    }

    /// Delete an article and everything hanging off it, in one transaction.
    pub async fn delete(&self, user_id: i64, article_id: i64) -> Result<String, AppError> {
        let record = self.fetch(article_id).await?;
        if record.user_id != user_id {
            return Err(AppError::Forbidden(
                "not authorized to delete this article".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM comment_reactions \
             WHERE comment_id IN (SELECT id FROM comments WHERE article_id = ?)",
        )
        .bind(article_id)
        .execute(&mut *tx)
        .await?;
        for table in ["notifications", "comments", "reactions", "favorites"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE article_id = ?"))
                .bind(article_id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(article_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(format!("article '{}' deleted", record.title))
    }

    /// List articles with optional accent-insensitive filters, AND-combined.
    pub async fn list(
        &self,
        filter: &ArticleFilter,
        viewer: Option<i64>,
    ) -> Result<Vec<ArticleResponse>, AppError> {
        let records: Vec<ArticleRecord> =
            sqlx::query_as(&format!("{ARTICLE_SELECT} ORDER BY a.created_at DESC, a.id DESC"))
                .fetch_all(&self.pool)
                .await?;

        let favorites = self.favorite_ids(viewer).await?;
        let norm_query = filter.q.as_deref().map(normalize);
        let norm_tag = filter.tag.as_deref().map(normalize);

        let result = records
            .into_iter()
            .filter(|record| {
                if let Some(wanted_slug) = filter.tag_slug.as_deref() {
                    if slugify(record.tag.as_deref().unwrap_or("")) != wanted_slug {
                        return false;
                    }
                }
                if let Some(wanted_tag) = norm_tag.as_deref() {
                    if normalize(record.tag.as_deref().unwrap_or("")) != wanted_tag {
                        return false;
                    }
                }
                if let Some(query) = norm_query.as_deref() {
                    let title = normalize(&record.title);
                    let content = normalize(&record.content);
                    if !title.contains(query) && !content.contains(query) {
                        return false;
                    }
                }
                true
            })
            .map(|record| {
                let is_favorite = favorites.contains(&record.id);
                record.into_response(is_favorite)
            })
            .collect();
        Ok(result)
    }

    pub async fn list_by_author(&self, author_id: i64) -> Result<Vec<ArticleResponse>, AppError> {
        let records: Vec<ArticleRecord> = sqlx::query_as(&format!(
            "{ARTICLE_SELECT} WHERE a.user_id = ? ORDER BY a.created_at DESC, a.id DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records
            .into_iter()
            .map(|record| record.into_response(false))
            .collect())
    }

    /// The caller's favorited articles.
    pub async fn favorites_of(&self, user_id: i64) -> Result<Vec<ArticleResponse>, AppError> {
        let records: Vec<ArticleRecord> = sqlx::query_as(&format!(
            "{ARTICLE_SELECT} JOIN favorites f ON f.article_id = a.id \
             WHERE f.user_id = ? ORDER BY a.created_at DESC, a.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records
            .into_iter()
            .map(|record| record.into_response(true))
            .collect())
    }

    pub async fn owner_of(&self, article_id: i64) -> Result<i64, AppError> {
        Ok(self.fetch(article_id).await?.user_id)
    }

    pub async fn set_pdf_url(&self, article_id: i64, pdf_url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE articles SET pdf_url = ? WHERE id = ?")
            .bind(pdf_url)
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_image_url(&self, article_id: i64, image_url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE articles SET image_url = ? WHERE id = ?")
            .bind(image_url)
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch(&self, article_id: i64) -> Result<ArticleRecord, AppError> {
        let record: Option<ArticleRecord> =
            sqlx::query_as(&format!("{ARTICLE_SELECT} WHERE a.id = ?"))
                .bind(article_id)
                .fetch_optional(&self.pool)
                .await?;
        record.ok_or_else(|| AppError::NotFound("article not found".into()))
    }

    async fn is_favorite(&self, user_id: i64, article_id: i64) -> Result<bool, AppError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM favorites WHERE user_id = ? AND article_id = ?")
                .bind(user_id)
                .bind(article_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn favorite_ids(&self, viewer: Option<i64>) -> Result<HashSet<i64>, AppError> {
        let Some(user_id) = viewer else {
            return Ok(HashSet::new());
        };
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT article_id FROM favorites WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Best effort: when an article carries a PDF but no image, try to
    /// render a first-page thumbnail. Failures are logged and swallowed.
    async fn generate_missing_thumbnail(&self, article_id: i64) {
        let row: Result<Option<(Option<String>, Option<String>)>, _> =
            sqlx::query_as("SELECT pdf_url, image_url FROM articles WHERE id = ?")
                .bind(article_id)
                .fetch_optional(&self.pool)
                .await;
        let Ok(Some((Some(pdf_url), None))) = row else {
            return;
        };
        let Some(data_url) = self.thumbnails.thumbnail_data_url(&pdf_url).await else {
            return;
        };
        if let Err(e) = self.set_image_url(article_id, &data_url).await {
            tracing::warn!(article_id, error = %e, "failed to store generated thumbnail");
        }
    }
}

fn normalize_newlines(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}
