pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

/// Initialize tracing with an `EnvFilter` (`RUST_LOG`), defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
