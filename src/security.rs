//! Bearer-token authentication.
//!
//! Replaces ambient session state with an explicit, request-scoped
//! [`CurrentUser`] extractor: the token is validated, then the user's
//! existence is confirmed against the database so revoked accounts cannot
//! keep acting on a stale token.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::warn;

use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Issue an HS256 token for the given user id.
pub fn issue_token(secret: &[u8], user_id: i64, ttl_hours: i64) -> Result<String, AppError> {
    let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
}

/// Validate a token and return the user id it was issued for.
pub fn verify_token(secret: &[u8], token: &str) -> Result<i64, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map_err(|e| AppError::Unauthenticated(format!("invalid token: {e}")))?;
    data.claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthenticated("invalid token subject".into()))
}

fn extract_bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("authentication required".into()))?;
    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthenticated("invalid authorization header".into()))?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AppError::Unauthenticated(
            "invalid authorization scheme".into(),
        )),
    }
}

/// The authenticated caller, resolved per request.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
    Arc<AppConfig>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)?;
        let config = Arc::<AppConfig>::from_ref(state);
        let user_id = verify_token(config.jwt_secret.as_bytes(), token)?;

        let pool = SqlitePool::from_ref(state);
        let row: Option<(String,)> = sqlx::query_as("SELECT username FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&pool)
            .await?;

        match row {
            Some((username,)) => Ok(CurrentUser {
                id: user_id,
                username,
            }),
            None => {
                warn!(user_id, "token subject no longer exists");
                Err(AppError::Unauthenticated("user not found".into()))
            }
        }
    }
}

/// `Option<CurrentUser>` yields `None` when no Authorization header is
/// present; a header that is present but invalid is still rejected.
impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
    Arc<AppConfig>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        if parts.headers.get(AUTHORIZATION).is_none() {
            return Ok(None);
        }
        <Self as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}
