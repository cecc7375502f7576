//! Shared application state for all routes.

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::images::ImageStore;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtKeys>,
    pub images: ImageStore,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_ttl_secs);
        let images = ImageStore::new(config.uploads_dir.clone());
        AppState {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            images,
        }
    }
}
