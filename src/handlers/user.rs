//! Login, registration and token refresh.

use crate::error::AppError;
use crate::extractors::{JsonBody, LoggedUser};
use crate::models::{AuthToken, User};
use crate::response::{success_one, SuccessOne};
use crate::service::validation::CredentialsBody;
use crate::service::UserService;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CredentialsBody>,
) -> Result<Json<AuthToken>, AppError> {
    let credentials = body.validate()?;
    let token = UserService::login(&state.pool, &state.jwt, credentials).await?;
    Ok(Json(token))
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CredentialsBody>,
) -> Result<(StatusCode, Json<SuccessOne<User>>), AppError> {
    let credentials = body.validate()?;
    let user = UserService::register(&state.pool, credentials).await?;
    Ok(success_one(user))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    LoggedUser(user): LoggedUser,
) -> Result<Json<AuthToken>, AppError> {
    let token = UserService::refresh(&state.pool, &state.jwt, &user).await?;
    Ok(Json(token))
}
