//! Account routes under `/api/user`.

use crate::handlers::user::{login, refresh_token, register};
use crate::routes::authenticated;
use crate::state::AppState;
use axum::{routing::post, Router};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/user/login", post(login))
        .route("/user/register", post(register))
        .route("/user/refresh-token", authenticated(state, post(refresh_token)))
}
