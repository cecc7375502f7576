//! Products: admin listing and writes, storefront lookups, feed candidates.

use crate::catalog::{FeedOrder, ListQuery, LATEST_LIMIT};
use crate::error::AppError;
use crate::extractors::UploadedFile;
use crate::images::{Gallery, ImageStore};
use crate::models::{Category, Product, ProductDetails, STATUS_ACTIVE};
use crate::response::Paginated;
use crate::service::gallery;
use crate::service::shared::{as_count, available_slug};
use crate::service::validation::ProductInput;
use crate::sql::{push_limit_offset, push_product_filters, FilterScope, PRODUCT_COLUMNS};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

#[derive(sqlx::FromRow)]
struct CategoryLink {
    product_id: i32,
    #[sqlx(flatten)]
    category: Category,
}

pub struct ProductService;

impl ProductService {
    fn select() -> String {
        format!("SELECT {PRODUCT_COLUMNS} FROM products p")
    }

    /// Admin listing, any status. Default order is newest id first.
    pub async fn list(
        pool: &PgPool,
        query: &ListQuery,
    ) -> Result<Paginated<ProductDetails>, AppError> {
        let mut conn = pool.acquire().await?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_product_filters(&mut count_qb, query, FilterScope::default());
        let count: i64 = count_qb.build_query_scalar().fetch_one(&mut *conn).await?;

        let mut qb = QueryBuilder::<Postgres>::new(Self::select());
        push_product_filters(&mut qb, query, FilterScope::default());
        match query.sort {
            Some((column, direction)) => {
                qb.push(format!(" ORDER BY p.{} {}, p.id DESC", column.column(), direction.sql()));
            }
            None => {
                qb.push(" ORDER BY p.id DESC");
            }
        }
        push_limit_offset(&mut qb, query.page.limit(), query.page.offset());
        let products: Vec<Product> = qb.build_query_as().fetch_all(&mut *conn).await?;

        let items = Self::with_relations(&mut conn, products, true).await?;
        Ok(Paginated::new(items, as_count(count), query.page.per_page))
    }

    /// Every product with its images, newest first.
    pub async fn all(pool: &PgPool) -> Result<Vec<ProductDetails>, AppError> {
        let mut conn = pool.acquire().await?;
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p ORDER BY p.id DESC"
        ))
        .fetch_all(&mut *conn)
        .await?;
        Self::with_relations(&mut conn, products, false).await
    }

    pub async fn stats(pool: &PgPool) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p ORDER BY p.id DESC"
        ))
        .fetch_all(pool)
        .await?;
        Ok(products)
    }

    /// Active products matching the storefront filters, in `orderBy` order.
    pub async fn feed(
        conn: &mut PgConnection,
        query: &ListQuery,
    ) -> Result<Vec<ProductDetails>, AppError> {
        let order = query.order_by.unwrap_or_default();
        let mut qb = QueryBuilder::<Postgres>::new(Self::select());
        push_product_filters(&mut qb, query, FilterScope { active_only: true });
        qb.push(format!(" ORDER BY p.{}", order.sql()));
        if order != FeedOrder::Recent {
            qb.push(", p.id DESC");
        }
        let products: Vec<Product> = qb.build_query_as().fetch_all(&mut *conn).await?;
        Self::with_relations(conn, products, true).await
    }

    pub async fn latest(conn: &mut PgConnection) -> Result<Vec<ProductDetails>, AppError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.status = $1 ORDER BY p.id DESC LIMIT $2"
        ))
        .bind(STATUS_ACTIVE)
        .bind(LATEST_LIMIT as i64)
        .fetch_all(&mut *conn)
        .await?;
        Self::with_relations(conn, products, false).await
    }

    pub async fn by_slug(pool: &PgPool, slug: &str) -> Result<ProductDetails, AppError> {
        let mut conn = pool.acquire().await?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.slug = $1 AND p.status = $2"
        ))
        .bind(slug)
        .bind(STATUS_ACTIVE)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", slug)))?;
        Self::with_relations(&mut conn, vec![product], true)
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("product {}", slug)))
    }

    /// Products keyed by id, with images. Missing ids are simply absent.
    pub(crate) async fn by_ids(
        conn: &mut PgConnection,
        ids: &[i32],
    ) -> Result<HashMap<i32, ProductDetails>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;
        let details = Self::with_relations(conn, products, false).await?;
        Ok(details.into_iter().map(|d| (d.product.id, d)).collect())
    }

    async fn with_relations(
        conn: &mut PgConnection,
        products: Vec<Product>,
        with_categories: bool,
    ) -> Result<Vec<ProductDetails>, AppError> {
        let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
        let mut images = gallery::load(conn, Gallery::Products, &ids).await?;
        let mut categories = if with_categories {
            Some(Self::categories_of(conn, &ids).await?)
        } else {
            None
        };
        Ok(products
            .into_iter()
            .map(|product| ProductDetails {
                images: images.remove(&product.id).unwrap_or_default(),
                categories: categories
                    .as_mut()
                    .map(|by_product| by_product.remove(&product.id).unwrap_or_default()),
                product,
            })
            .collect())
    }

    async fn categories_of(
        conn: &mut PgConnection,
        ids: &[i32],
    ) -> Result<HashMap<i32, Vec<Category>>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let links: Vec<CategoryLink> = sqlx::query_as(
            "SELECT pc.product_id, c.id, c.name, c.status FROM products_categories pc \
             JOIN categories c ON c.id = pc.category_id \
             WHERE pc.product_id = ANY($1) ORDER BY c.id",
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;
        let mut out: HashMap<i32, Vec<Category>> = HashMap::new();
        for link in links {
            out.entry(link.product_id).or_default().push(link.category);
        }
        Ok(out)
    }

    pub async fn create(
        pool: &PgPool,
        store: &ImageStore,
        input: ProductInput,
        files: &[UploadedFile],
    ) -> Result<i32, AppError> {
        let mut tx = pool.begin().await?;
        let categories = Self::known_categories(&mut tx, &input.categories).await?;
        let slug = available_slug(&mut tx, "products", &input.name, None).await?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO products \
             (name, width, height, depth, stock, price, old_price, status, slug) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
        )
        .bind(&input.name)
        .bind(input.width)
        .bind(input.height)
        .bind(input.depth)
        .bind(input.stock)
        .bind(input.price)
        .bind(input.old_price)
        .bind(&input.status)
        .bind(&slug)
        .fetch_one(&mut *tx)
        .await?;

        Self::set_categories(&mut tx, id, &categories).await?;
        let stored =
            gallery::save(&mut tx, store, Gallery::Products, id, files, &input.images_order).await?;
        gallery::commit_with(tx, store, stored).await?;
        tracing::info!(product_id = id, slug = %slug, "product created");
        Ok(id)
    }

    pub async fn update(
        pool: &PgPool,
        store: &ImageStore,
        id: i32,
        input: ProductInput,
        files: &[UploadedFile],
    ) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        let exists: Option<i32> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("product {}", id)));
        }
        let categories = Self::known_categories(&mut tx, &input.categories).await?;
        let slug = available_slug(&mut tx, "products", &input.name, Some(id)).await?;

        sqlx::query(
            "UPDATE products SET name = $1, width = $2, height = $3, depth = $4, stock = $5, \
             price = $6, old_price = $7, status = $8, slug = $9, updated = NOW() WHERE id = $10",
        )
        .bind(&input.name)
        .bind(input.width)
        .bind(input.height)
        .bind(input.depth)
        .bind(input.stock)
        .bind(input.price)
        .bind(input.old_price)
        .bind(&input.status)
        .bind(&slug)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        Self::set_categories(&mut tx, id, &categories).await?;
        let stored =
            gallery::save(&mut tx, store, Gallery::Products, id, files, &input.images_order).await?;
        gallery::commit_with(tx, store, stored).await?;
        tracing::info!(product_id = id, slug = %slug, "product updated");
        Ok(())
    }

    pub async fn delete_image(
        pool: &PgPool,
        store: &ImageStore,
        id: i32,
        image_id: i32,
    ) -> Result<(), AppError> {
        gallery::remove_image(pool, store, Gallery::Products, id, image_id).await
    }

    /// Products that belong to a package or an order cannot be deleted.
    pub async fn delete(pool: &PgPool, store: &ImageStore, id: i32) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM package_products WHERE product_id = $1) \
             OR EXISTS(SELECT 1 FROM order_products WHERE product_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if referenced {
            return Err(AppError::Conflict("Product is part of a package or an order.".into()));
        }
        let done = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if done.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("product {}", id)));
        }
        tx.commit().await?;
        gallery::remove_all(store, Gallery::Products, id).await?;
        tracing::info!(product_id = id, "product deleted");
        Ok(())
    }

    /// The requested category ids that exist; unknown ids are dropped.
    async fn known_categories(conn: &mut PgConnection, ids: &[i32]) -> Result<Vec<i32>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM categories WHERE id = ANY($1) ORDER BY id")
                .bind(ids)
                .fetch_all(&mut *conn)
                .await?;
        if found.len() != ids.len() {
            tracing::debug!(
                skipped = ids.len() - found.len(),
                "unknown product categories skipped"
            );
        }
        Ok(found)
    }

    async fn set_categories(
        conn: &mut PgConnection,
        id: i32,
        categories: &[i32],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM products_categories WHERE product_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if !categories.is_empty() {
            sqlx::query(
                "INSERT INTO products_categories (product_id, category_id) \
                 SELECT $1, UNNEST($2::int[])",
            )
            .bind(id)
            .bind(categories)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}
