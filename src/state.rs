use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::services::articles::ArticleService;
use crate::services::auth::AuthService;
use crate::services::chat::ChatClient;
use crate::services::comments::CommentService;
use crate::services::interactions::InteractionService;
use crate::services::notifications::NotificationService;
use crate::services::thumbnail::{NoopRenderer, ThumbnailRenderer, ThumbnailService};

/// Shared application state: the pool, configuration, and one instance of
/// each service.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub articles: ArticleService,
    pub comments: CommentService,
    pub interactions: InteractionService,
    pub notifications: NotificationService,
    pub chat: ChatClient,
    pub thumbnails: ThumbnailService,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        Self::with_renderer(pool, config, Arc::new(NoopRenderer))
    }

    /// Wire the state with a specific thumbnail renderer (tests inject a
    /// fake one here).
    pub fn with_renderer(
        pool: SqlitePool,
        config: AppConfig,
        renderer: Arc<dyn ThumbnailRenderer>,
    ) -> Self {
        let config = Arc::new(config);
        let http = reqwest::Client::new();
        let thumbnails = ThumbnailService::new(http.clone(), renderer);
        Self {
            auth: AuthService::new(pool.clone(), config.clone()),
            articles: ArticleService::new(pool.clone(), thumbnails.clone()),
            comments: CommentService::new(pool.clone()),
            interactions: InteractionService::new(pool.clone()),
            notifications: NotificationService::new(pool.clone()),
            chat: ChatClient::new(http.clone(), config.clone()),
            thumbnails,
            http,
            pool,
            config,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
