//! Accounts: lookup, login, registration and session tokens.

use crate::auth::{hash_password, verify_password, JwtKeys};
use crate::error::AppError;
use crate::models::{AuthToken, User, ROLE_USER, STATUS_ACTIVE};
use crate::service::shared::blocking;
use crate::service::validation::Credentials;
use chrono::Utc;
use sqlx::PgPool;

pub const INVALID_CREDENTIALS_MSG: &str = "Invalid credentials!";

const USER_SELECT: &str = "SELECT u.id, u.email, u.password, u.token, r.name AS role, u.status \
     FROM users u JOIN user_roles r ON r.id = u.role_id";

pub struct UserService;

impl UserService {
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn find_active_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "{USER_SELECT} WHERE u.email = $1 AND u.status = $2"
        ))
        .bind(email)
        .bind(STATUS_ACTIVE)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// Checks the password, issues a token and stores it as the user's current session.
    pub async fn login(
        pool: &PgPool,
        jwt: &JwtKeys,
        credentials: Credentials,
    ) -> Result<AuthToken, AppError> {
        let Some(user) = Self::find_active_by_email(pool, &credentials.email).await? else {
            tracing::warn!(email = %credentials.email, "login for unknown or inactive user");
            return Err(AppError::BadRequest(INVALID_CREDENTIALS_MSG.into()));
        };

        let hash = user.password.clone();
        let matches = blocking(move || Ok(verify_password(&credentials.password, &hash))).await?;
        if !matches {
            tracing::warn!(user_id = user.id, "login with wrong password");
            return Err(AppError::BadRequest(INVALID_CREDENTIALS_MSG.into()));
        }

        let token = Self::start_session(pool, jwt, &user).await?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok(token)
    }

    /// Creates an active account with the `user` role.
    pub async fn register(pool: &PgPool, credentials: Credentials) -> Result<User, AppError> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&credentials.email)
            .fetch_one(pool)
            .await?;
        if taken {
            return Err(AppError::Conflict("Email already registered.".into()));
        }

        let password = credentials.password;
        let hash = blocking(move || hash_password(&password)).await?;
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO users (email, password, role_id, status) \
             SELECT $1, $2, id, $4 FROM user_roles WHERE name = $3 RETURNING id",
        )
        .bind(&credentials.email)
        .bind(hash)
        .bind(ROLE_USER)
        .bind(STATUS_ACTIVE)
        .fetch_one(pool)
        .await?;
        tracing::info!(user_id = id, "user registered");

        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    /// New token for an already authenticated user; the previous one stops working.
    pub async fn refresh(pool: &PgPool, jwt: &JwtKeys, user: &User) -> Result<AuthToken, AppError> {
        let token = Self::start_session(pool, jwt, user).await?;
        tracing::debug!(user_id = user.id, "token refreshed");
        Ok(token)
    }

    async fn start_session(
        pool: &PgPool,
        jwt: &JwtKeys,
        user: &User,
    ) -> Result<AuthToken, AppError> {
        let token = jwt.issue(user, Utc::now())?;
        sqlx::query("UPDATE users SET token = $1, updated = NOW() WHERE id = $2")
            .bind(&token)
            .bind(user.id)
            .execute(pool)
            .await?;
        Ok(AuthToken {
            email: user.email.clone(),
            token,
        })
    }
}
