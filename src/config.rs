use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::{info, warn};

/// Application configuration, loaded from the environment (plus a `.env`
/// file when present).
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// SQLite connection string.
    pub database_url: String,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: String,
    /// Bearer token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Root directory served under `/static`; uploads land below it.
    pub static_dir: String,
    /// API key for the chat completions upstream. Chat endpoint returns an
    /// error when unset.
    pub chat_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible upstream.
    pub chat_api_base: String,
    /// Model name forwarded to the upstream.
    pub chat_model: String,
    /// System instruction prepended to every chat conversation.
    pub chat_system_instruction: String,
    /// Greeting sent as the sole user message when the history is empty.
    pub chat_initial_greeting: String,
}

const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are the site assistant. Answer briefly and directly, using only the \
     authorized knowledge base.";

const DEFAULT_INITIAL_GREETING: &str =
    "Hello, I am the site assistant. How can I help you today?";

impl AppConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self {
            bind_addr: try_load("TINTA_BIND_ADDR", "0.0.0.0:8000"),
            database_url: try_load("DATABASE_URL", "sqlite://tinta.db?mode=rwc"),
            jwt_secret: load_secret("TINTA_JWT_SECRET"),
            token_ttl_hours: try_load("TINTA_TOKEN_TTL_HOURS", "24"),
            static_dir: try_load("TINTA_STATIC_DIR", "static"),
            chat_api_key: env::var("OPENAI_API_KEY").ok(),
            chat_api_base: try_load("CHAT_API_BASE", "https://api.openai.com/v1"),
            chat_model: try_load("CHAT_MODEL", "gpt-4o-mini"),
            chat_system_instruction: try_load(
                "CHAT_SYSTEM_INSTRUCTION",
                DEFAULT_SYSTEM_INSTRUCTION,
            ),
            chat_initial_greeting: try_load("CHAT_INITIAL_GREETING", DEFAULT_INITIAL_GREETING),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn load_secret(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{key} not set, using an insecure development secret");
        "tinta-dev-secret-change-in-production".to_string()
    })
}
