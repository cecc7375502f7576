//! Figurine shop: REST backend for a catalog of products and packages, with orders and users.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod images;
pub mod models;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, ConfigError};
pub use response::Paginated;
pub use routes::{app, common_routes};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables, seed};
