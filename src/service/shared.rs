//! Helpers shared by the catalog services.

use crate::catalog::{generate_slug, unique_slug};
use crate::error::AppError;
use sqlx::PgConnection;
use std::collections::HashSet;

/// Used when a name has no sluggable characters at all.
const FALLBACK_SLUG: &str = "item";

/// Free slug for `name` in `table`, ignoring the row `exclude` (the row being updated).
/// `table` must be a fixed identifier.
pub(crate) async fn available_slug(
    conn: &mut PgConnection,
    table: &'static str,
    name: &str,
    exclude: Option<i32>,
) -> Result<String, AppError> {
    let base = match generate_slug(name) {
        s if s.is_empty() => FALLBACK_SLUG.to_string(),
        s => s,
    };
    let sql = format!(
        "SELECT slug FROM {} WHERE left(slug, char_length($1)) = $1 \
         AND ($2::int IS NULL OR id <> $2)",
        table
    );
    let taken: Vec<String> = sqlx::query_scalar(&sql)
        .bind(&base)
        .bind(exclude)
        .fetch_all(&mut *conn)
        .await?;
    let taken: HashSet<String> = taken.into_iter().collect();
    Ok(unique_slug(&base, &taken))
}

/// Runs CPU-heavy work (bcrypt) off the async workers.
pub async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

/// Row count as returned by `COUNT(*)`, never negative.
pub(crate) fn as_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}
