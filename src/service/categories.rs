//! Category CRUD and the paginated admin listing with usage counts.

use crate::catalog::Page;
use crate::error::AppError;
use crate::models::{Category, CategorySummary};
use crate::response::Paginated;
use crate::service::shared::as_count;
use crate::service::validation::CategoryInput;
use crate::sql::{like_pattern, push_limit_offset};
use sqlx::{PgPool, Postgres, QueryBuilder};

pub struct CategoryService;

impl CategoryService {
    pub async fn list(
        pool: &PgPool,
        page: Page,
        search: Option<&str>,
    ) -> Result<Paginated<CategorySummary>, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM categories c");
        push_search(&mut count_qb, search);
        let count: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT c.id, c.name, c.status, \
             (SELECT COUNT(*) FROM products_categories pc WHERE pc.category_id = c.id) \
             AS product_count, \
             (SELECT COUNT(*) FROM packages k WHERE k.category_id = c.id) AS package_count \
             FROM categories c",
        );
        push_search(&mut qb, search);
        qb.push(" ORDER BY c.id ASC");
        push_limit_offset(&mut qb, page.limit(), page.offset());
        let items: Vec<CategorySummary> = qb.build_query_as().fetch_all(pool).await?;

        Ok(Paginated::new(items, as_count(count), page.per_page))
    }

    pub async fn all(pool: &PgPool) -> Result<Vec<Category>, AppError> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, status FROM categories ORDER BY id ASC",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(pool: &PgPool, input: CategoryInput) -> Result<i32, AppError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO categories (name, status) VALUES ($1, $2) RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.status)
        .fetch_one(pool)
        .await?;
        tracing::info!(category_id = id, name = %input.name, "category created");
        Ok(id)
    }

    pub async fn update(pool: &PgPool, id: i32, input: CategoryInput) -> Result<(), AppError> {
        let done = sqlx::query(
            "UPDATE categories SET name = $1, status = $2, updated = NOW() WHERE id = $3",
        )
        .bind(&input.name)
        .bind(&input.status)
        .bind(id)
        .execute(pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("category {}", id)));
        }
        tracing::info!(category_id = id, "category updated");
        Ok(())
    }

    /// Product links go with the category; packages must be moved first.
    pub async fn delete(pool: &PgPool, id: i32) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        let in_use: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM packages WHERE category_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if in_use {
            return Err(AppError::Conflict("Category is used by packages.".into()));
        }
        let done = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if done.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("category {}", id)));
        }
        tx.commit().await?;
        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }
}

fn push_search(qb: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        qb.push(" WHERE c.name ILIKE ").push_bind(like_pattern(term));
    }
}
