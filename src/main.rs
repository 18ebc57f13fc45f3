use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use tinta::config::AppConfig;
use tinta::routes::build_router;
use tinta::state::AppState;

#[tokio::main]
async fn main() {
    tinta::init_tracing();
    let config = AppConfig::load();

    let options = SqliteConnectOptions::from_str(&config.database_url)
        .expect("invalid DATABASE_URL")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("failed to open database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let bind_addr = config.bind_addr.clone();
    let app = build_router(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind");
    info!("listening on {bind_addr}");
    axum::serve(listener, app).await.expect("server error");
}
