//! Request guards: a valid session token for any user, or an admin user.

use crate::auth::jwt::INVALID_TOKEN_MSG;
use crate::error::AppError;
use crate::extractors::LoggedUser;
use crate::service::UserService;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

pub const TOKEN_REQUIRED_MSG: &str = "A token is required for authentication";
pub const SESSION_MISMATCH_MSG: &str = "Something went wrong, refresh and try again!";

/// Second word of the `Authorization` header (`Bearer <token>`).
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_whitespace().nth(1))
        .filter(|t| !t.is_empty())
}

/// Verifies the token, loads its user and checks the token is that user's current session.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Forbidden(TOKEN_REQUIRED_MSG.into()))?
        .to_string();

    let claims = state.jwt.verify(&token, Utc::now()).map_err(|e| {
        tracing::warn!(uri = %req.uri(), "rejected token");
        e
    })?;

    let user = UserService::find_by_id(&state.pool, claims.user_id).await?;
    let user = match user {
        Some(u) if u.token.as_deref() == Some(token.as_str()) => u,
        _ => {
            tracing::warn!(user_id = claims.user_id, "token does not match stored session");
            return Err(AppError::BadRequest(SESSION_MISMATCH_MSG.into()));
        }
    };

    req.extensions_mut().insert(LoggedUser(user));
    Ok(next.run(req).await)
}

/// Must run after [`require_user`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    match req.extensions().get::<LoggedUser>() {
        Some(LoggedUser(user)) if user.is_admin() => Ok(next.run(req).await),
        Some(LoggedUser(user)) => {
            tracing::warn!(user_id = user.id, uri = %req.uri(), "admin route denied");
            Err(AppError::Forbidden("admin role required".into()))
        }
        None => Err(AppError::Unauthorized(INVALID_TOKEN_MSG.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_second_word() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("abc.def"));
        assert_eq!(bearer_token(&headers), None);
    }
}
