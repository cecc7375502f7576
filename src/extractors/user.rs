//! The authenticated user, placed in request extensions by the auth guard.

use crate::auth::middleware::TOKEN_REQUIRED_MSG;
use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

#[derive(Clone, Debug)]
pub struct LoggedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for LoggedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<LoggedUser>()
            .cloned()
            .ok_or_else(|| AppError::Forbidden(TOKEN_REQUIRED_MSG.into()))
    }
}
