//! Packages: bundles of products with quantities, sold as one catalog item.

use crate::catalog::{FeedOrder, ListQuery, LATEST_LIMIT};
use crate::error::AppError;
use crate::extractors::UploadedFile;
use crate::images::{Gallery, ImageStore};
use crate::models::{Category, Package, PackageDetails, PackageItem, PackageItemRow, STATUS_ACTIVE};
use crate::response::Paginated;
use crate::service::gallery;
use crate::service::products::ProductService;
use crate::service::shared::{as_count, available_slug};
use crate::service::validation::{PackageInput, PackageProductInput};
use crate::sql::{push_limit_offset, push_package_filters, FilterScope, PACKAGE_COLUMNS};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use std::collections::{HashMap, HashSet};

pub const EMPTY_PACKAGE_MSG: &str = "Package must contain products.";
pub const INVALID_CATEGORY_MSG: &str = "Invalid category.";

/// Which relations to load next to the images.
#[derive(Clone, Copy, Debug)]
struct Relations {
    category: bool,
    items: bool,
}

impl Relations {
    const IMAGES: Relations = Relations {
        category: false,
        items: false,
    };
    const WITH_CATEGORY: Relations = Relations {
        category: true,
        items: false,
    };
    const FULL: Relations = Relations {
        category: true,
        items: true,
    };
}

pub struct PackageService;

impl PackageService {
    fn select() -> String {
        format!("SELECT {PACKAGE_COLUMNS} FROM packages k")
    }

    /// Active packages. `orderBy` first, then stock and id descending.
    pub async fn list(
        pool: &PgPool,
        query: &ListQuery,
    ) -> Result<Paginated<PackageDetails>, AppError> {
        let mut conn = pool.acquire().await?;
        let scope = FilterScope { active_only: true };

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM packages k");
        push_package_filters(&mut count_qb, query, scope);
        let count: i64 = count_qb.build_query_scalar().fetch_one(&mut *conn).await?;

        let mut qb = QueryBuilder::<Postgres>::new(Self::select());
        push_package_filters(&mut qb, query, scope);
        qb.push(" ORDER BY ");
        if let Some(order) = query.order_by {
            qb.push(format!("k.{}, ", order.sql()));
        }
        qb.push("k.stock DESC, k.id DESC");
        push_limit_offset(&mut qb, query.page.limit(), query.page.offset());
        let packages: Vec<Package> = qb.build_query_as().fetch_all(&mut *conn).await?;

        let items = Self::with_relations(&mut conn, packages, Relations::FULL).await?;
        Ok(Paginated::new(items, as_count(count), query.page.per_page))
    }

    pub async fn stats(pool: &PgPool) -> Result<Vec<Package>, AppError> {
        let packages = sqlx::query_as::<_, Package>(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages k WHERE k.status = $1 ORDER BY k.id DESC"
        ))
        .bind(STATUS_ACTIVE)
        .fetch_all(pool)
        .await?;
        Ok(packages)
    }

    /// Every package, any status, with images.
    pub async fn all(pool: &PgPool) -> Result<Vec<PackageDetails>, AppError> {
        let mut conn = pool.acquire().await?;
        let packages = sqlx::query_as::<_, Package>(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages k ORDER BY k.id DESC"
        ))
        .fetch_all(&mut *conn)
        .await?;
        Self::with_relations(&mut conn, packages, Relations::IMAGES).await
    }

    /// Active packages matching the storefront filters, in `orderBy` order.
    pub async fn feed(
        conn: &mut PgConnection,
        query: &ListQuery,
    ) -> Result<Vec<PackageDetails>, AppError> {
        let order = query.order_by.unwrap_or_default();
        let mut qb = QueryBuilder::<Postgres>::new(Self::select());
        push_package_filters(&mut qb, query, FilterScope { active_only: true });
        qb.push(format!(" ORDER BY k.{}", order.sql()));
        if order != FeedOrder::Recent {
            qb.push(", k.id DESC");
        }
        let packages: Vec<Package> = qb.build_query_as().fetch_all(&mut *conn).await?;
        Self::with_relations(conn, packages, Relations::WITH_CATEGORY).await
    }

    pub async fn latest(conn: &mut PgConnection) -> Result<Vec<PackageDetails>, AppError> {
        let packages = sqlx::query_as::<_, Package>(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages k \
             WHERE k.status = $1 ORDER BY k.id DESC LIMIT $2"
        ))
        .bind(STATUS_ACTIVE)
        .bind(LATEST_LIMIT as i64)
        .fetch_all(&mut *conn)
        .await?;
        Self::with_relations(conn, packages, Relations::IMAGES).await
    }

    pub async fn by_slug(pool: &PgPool, slug: &str) -> Result<PackageDetails, AppError> {
        let mut conn = pool.acquire().await?;
        let package = sqlx::query_as::<_, Package>(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages k WHERE k.slug = $1 AND k.status = $2"
        ))
        .bind(slug)
        .bind(STATUS_ACTIVE)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("package {}", slug)))?;
        Self::with_relations(&mut conn, vec![package], Relations::FULL)
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("package {}", slug)))
    }

    /// Images always; category and items as `relations` asks.
    async fn with_relations(
        conn: &mut PgConnection,
        packages: Vec<Package>,
        relations: Relations,
    ) -> Result<Vec<PackageDetails>, AppError> {
        let ids: Vec<i32> = packages.iter().map(|p| p.id).collect();
        let mut images = gallery::load(conn, Gallery::Packages, &ids).await?;

        let categories = if relations.category {
            let category_ids: Vec<i32> = packages.iter().map(|p| p.category_id).collect();
            let categories: HashMap<i32, Category> = sqlx::query_as::<_, Category>(
                "SELECT id, name, status FROM categories WHERE id = ANY($1)",
            )
            .bind(&category_ids)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
            Some(categories)
        } else {
            None
        };
        let mut items = if relations.items {
            Some(Self::items_of(conn, &ids).await?)
        } else {
            None
        };

        Ok(packages
            .into_iter()
            .map(|package| PackageDetails {
                images: images.remove(&package.id).unwrap_or_default(),
                category: categories
                    .as_ref()
                    .and_then(|by_id| by_id.get(&package.category_id).cloned()),
                products: items
                    .as_mut()
                    .map(|by_package| by_package.remove(&package.id).unwrap_or_default()),
                package,
            })
            .collect())
    }

    async fn items_of(
        conn: &mut PgConnection,
        ids: &[i32],
    ) -> Result<HashMap<i32, Vec<PackageItem>>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<PackageItemRow> = sqlx::query_as(
            "SELECT id, package_id, product_id, quantity FROM package_products \
             WHERE package_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut product_ids: Vec<i32> = rows.iter().map(|r| r.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let products = ProductService::by_ids(conn, &product_ids).await?;

        let mut out: HashMap<i32, Vec<PackageItem>> = HashMap::new();
        for row in rows {
            if let Some(product) = products.get(&row.product_id) {
                out.entry(row.package_id).or_default().push(PackageItem {
                    id: row.id,
                    quantity: row.quantity,
                    product: product.clone(),
                });
            }
        }
        Ok(out)
    }

    pub async fn create(
        pool: &PgPool,
        store: &ImageStore,
        input: PackageInput,
        files: &[UploadedFile],
    ) -> Result<i32, AppError> {
        let mut tx = pool.begin().await?;
        Self::check_category(&mut tx, input.category_id).await?;
        let items = Self::known_items(&mut tx, &input.products).await?;
        let slug = available_slug(&mut tx, "packages", &input.name, None).await?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO packages (name, category_id, stock, price, old_price, status, slug) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&input.name)
        .bind(input.category_id)
        .bind(input.stock)
        .bind(input.price)
        .bind(input.old_price)
        .bind(&input.status)
        .bind(&slug)
        .fetch_one(&mut *tx)
        .await?;

        Self::sync_items(&mut tx, id, &items).await?;
        let stored =
            gallery::save(&mut tx, store, Gallery::Packages, id, files, &input.images_order).await?;
        gallery::commit_with(tx, store, stored).await?;
        tracing::info!(package_id = id, slug = %slug, items = items.len(), "package created");
        Ok(id)
    }

    pub async fn update(
        pool: &PgPool,
        store: &ImageStore,
        id: i32,
        input: PackageInput,
        files: &[UploadedFile],
    ) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        let exists: Option<i32> =
            sqlx::query_scalar("SELECT id FROM packages WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("package {}", id)));
        }
        Self::check_category(&mut tx, input.category_id).await?;
        let items = Self::known_items(&mut tx, &input.products).await?;
        let slug = available_slug(&mut tx, "packages", &input.name, Some(id)).await?;

        sqlx::query(
            "UPDATE packages SET name = $1, category_id = $2, stock = $3, price = $4, \
             old_price = $5, \
             status = $6, slug = $7, updated = NOW() WHERE id = $8",
        )
        .bind(&input.name)
        .bind(input.category_id)
        .bind(input.stock)
        .bind(input.price)
        .bind(input.old_price)
        .bind(&input.status)
        .bind(&slug)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        Self::sync_items(&mut tx, id, &items).await?;
        let stored =
            gallery::save(&mut tx, store, Gallery::Packages, id, files, &input.images_order).await?;
        gallery::commit_with(tx, store, stored).await?;
        tracing::info!(package_id = id, slug = %slug, items = items.len(), "package updated");
        Ok(())
    }

    pub async fn delete_image(
        pool: &PgPool,
        store: &ImageStore,
        id: i32,
        image_id: i32,
    ) -> Result<(), AppError> {
        gallery::remove_image(pool, store, Gallery::Packages, id, image_id).await
    }

    /// Ordered packages cannot be deleted.
    pub async fn delete(pool: &PgPool, store: &ImageStore, id: i32) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        let ordered: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM order_packages WHERE package_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if ordered {
            return Err(AppError::Conflict("Package is part of an order.".into()));
        }
        let done = sqlx::query("DELETE FROM packages WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if done.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("package {}", id)));
        }
        tx.commit().await?;
        gallery::remove_all(store, Gallery::Packages, id).await?;
        tracing::info!(package_id = id, "package deleted");
        Ok(())
    }

    async fn check_category(conn: &mut PgConnection, category_id: i32) -> Result<(), AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(category_id)
                .fetch_one(&mut *conn)
                .await?;
        if !exists {
            return Err(AppError::BadRequest(INVALID_CATEGORY_MSG.into()));
        }
        Ok(())
    }

    /// Drops entries whose product does not exist; an empty result is rejected.
    async fn known_items(
        conn: &mut PgConnection,
        requested: &[PackageProductInput],
    ) -> Result<Vec<PackageProductInput>, AppError> {
        let ids: Vec<i32> = requested.iter().map(|i| i.product_id).collect();
        let found: Vec<i32> = sqlx::query_scalar("SELECT id FROM products WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *conn)
            .await?;
        let found: HashSet<i32> = found.into_iter().collect();
        let items: Vec<PackageProductInput> = requested
            .iter()
            .filter(|i| found.contains(&i.product_id))
            .cloned()
            .collect();
        if items.len() < requested.len() {
            tracing::debug!(
                skipped = requested.len() - items.len(),
                "package items with unknown products skipped"
            );
        }
        if items.is_empty() {
            return Err(AppError::BadRequest(EMPTY_PACKAGE_MSG.into()));
        }
        Ok(items)
    }

    /// Makes the package's rows match `items`: missing removed, quantities updated, new added.
    async fn sync_items(
        conn: &mut PgConnection,
        package_id: i32,
        items: &[PackageProductInput],
    ) -> Result<(), AppError> {
        let product_ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
        let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();

        sqlx::query("DELETE FROM package_products WHERE package_id = $1 AND product_id <> ALL($2)")
            .bind(package_id)
            .bind(&product_ids)
            .execute(&mut *conn)
            .await?;
        sqlx::query(
            "INSERT INTO package_products (package_id, product_id, quantity) \
             SELECT $1, item.product_id, item.quantity \
             FROM UNNEST($2::int[], $3::int[]) AS item(product_id, quantity) \
             ON CONFLICT (package_id, product_id) \
             DO UPDATE SET quantity = EXCLUDED.quantity, updated = NOW()",
        )
        .bind(package_id)
        .bind(&product_ids)
        .bind(&quantities)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
