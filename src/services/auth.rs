//! Accounts: registration, login, and profile management.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest, User, UserProfile};
use crate::security::issue_token;

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(pool: SqlitePool, config: Arc<AppConfig>) -> Self {
        Self { pool, config }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<String, AppError> {
        let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(&request.email)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(AppError::BadRequest("email already registered".into()));
        }

        let password_hash = hash_password(&request.password)?;
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)",
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(&password_hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(format!("user {} registered", request.username)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::BadRequest("username already taken".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(&request.email)
            .fetch_optional(&self.pool)
            .await?;

        let user = user.filter(|u| verify_password(&u.password_hash, &request.password));
        match user {
            Some(user) => {
                let token = issue_token(
                    self.config.jwt_secret.as_bytes(),
                    user.id,
                    self.config.token_ttl_hours,
                )?;
                Ok(LoginResponse {
                    token,
                    user_id: user.id,
                    username: user.username,
                })
            }
            None => Err(AppError::Unauthenticated("invalid credentials".into())),
        }
    }

    /// The caller's own profile, email included.
    pub async fn profile(&self, user_id: i64) -> Result<UserProfile, AppError> {
        let user = self.fetch_user(user_id).await?;
        Ok(UserProfile {
            id: user.id,
            username: user.username,
            email: Some(user.email),
            first_name: user.first_name,
            last_name: user.last_name,
            area: user.area,
            photo_url: user.photo_url,
        })
    }

    /// Anyone's profile, without the email.
    pub async fn public_profile(&self, user_id: i64) -> Result<UserProfile, AppError> {
        let user = self.fetch_user(user_id).await?;
        Ok(UserProfile {
            id: user.id,
            username: user.username,
            email: None,
            first_name: user.first_name,
            last_name: user.last_name,
            area: user.area,
            photo_url: user.photo_url,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> Result<(), AppError> {
        let user = self.fetch_user(user_id).await?;
        sqlx::query(
            "UPDATE users SET first_name = ?, last_name = ?, area = ?, photo_url = ? \
             WHERE id = ?",
        )
        .bind(request.first_name.or(user.first_name))
        .bind(request.last_name.or(user.last_name))
        .bind(request.area.or(user.area))
        .bind(request.photo_url.or(user.photo_url))
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_user(&self, user_id: i64) -> Result<User, AppError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or_else(|| AppError::NotFound("user not found".into()))
    }
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

fn verify_password(stored_hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
