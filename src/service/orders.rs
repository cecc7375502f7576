//! Orders with their product and package lines.

use crate::catalog::Page;
use crate::error::AppError;
use crate::models::{Order, OrderDetails, OrderLine};
use crate::response::Paginated;
use crate::service::shared::as_count;
use crate::service::validation::{OrderInput, OrderLineInput};
use sqlx::{PgConnection, PgPool};
use std::collections::{HashMap, HashSet};

/// Line tables: `(table, item column, catalog table)`.
const PRODUCT_LINES: (&str, &str, &str) = ("order_products", "product_id", "products");
const PACKAGE_LINES: (&str, &str, &str) = ("order_packages", "package_id", "packages");

pub struct OrderService;

impl OrderService {
    /// Pending first, then working, then finished; newest first within a status.
    pub async fn list(pool: &PgPool, page: Page) -> Result<Paginated<OrderDetails>, AppError> {
        let mut conn = pool.acquire().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&mut *conn)
            .await?;
        let orders = sqlx::query_as::<_, Order>(
            "SELECT id, date, status FROM orders \
             ORDER BY array_position(ARRAY['pending', 'working', 'finished'], status), id DESC \
             LIMIT $1 OFFSET $2",
        )
        .bind(i64::try_from(page.limit()).unwrap_or(i64::MAX))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&mut *conn)
        .await?;
        let items = Self::with_lines(&mut conn, orders).await?;
        Ok(Paginated::new(items, as_count(count), page.per_page))
    }

    pub async fn create(pool: &PgPool, input: OrderInput) -> Result<OrderDetails, AppError> {
        let mut tx = pool.begin().await?;
        Self::check_items(&mut tx, PRODUCT_LINES, &input.products).await?;
        Self::check_items(&mut tx, PACKAGE_LINES, &input.packages).await?;

        let order: Order = sqlx::query_as(
            "INSERT INTO orders (date, status) VALUES ($1, $2) RETURNING id, date, status",
        )
        .bind(&input.date)
        .bind(&input.status)
        .fetch_one(&mut *tx)
        .await?;
        Self::insert_lines(&mut tx, PRODUCT_LINES, order.id, &input.products).await?;
        Self::insert_lines(&mut tx, PACKAGE_LINES, order.id, &input.packages).await?;

        let details = Self::with_lines(&mut tx, vec![order])
            .await?
            .pop()
            .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))?;
        tx.commit().await?;
        tracing::info!(
            order_id = details.order.id,
            products = details.products.len(),
            packages = details.packages.len(),
            "order created"
        );
        Ok(details)
    }

    pub async fn update_status(
        pool: &PgPool,
        id: i32,
        status: &str,
    ) -> Result<OrderDetails, AppError> {
        let mut conn = pool.acquire().await?;
        let order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $1, updated = NOW() WHERE id = $2 \
             RETURNING id, date, status",
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {}", id)))?;
        tracing::info!(order_id = id, status, "order status changed");
        Self::with_lines(&mut conn, vec![order])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("order {}", id)))
    }

    async fn with_lines(
        conn: &mut PgConnection,
        orders: Vec<Order>,
    ) -> Result<Vec<OrderDetails>, AppError> {
        let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let mut products = Self::lines_of(conn, PRODUCT_LINES, &ids).await?;
        let mut packages = Self::lines_of(conn, PACKAGE_LINES, &ids).await?;
        Ok(orders
            .into_iter()
            .map(|order| OrderDetails {
                products: products.remove(&order.id).unwrap_or_default(),
                packages: packages.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect())
    }

    async fn lines_of(
        conn: &mut PgConnection,
        (table, item, _): (&str, &str, &str),
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderLine>>, AppError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT id, order_id, {item} AS item_id, quantity, price FROM {table} \
             WHERE order_id = ANY($1) ORDER BY id"
        );
        let lines: Vec<OrderLine> = sqlx::query_as(&sql)
            .bind(order_ids)
            .fetch_all(&mut *conn)
            .await?;
        let mut out: HashMap<i32, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            out.entry(line.order_id).or_default().push(line);
        }
        Ok(out)
    }

    /// Every referenced product/package must exist.
    async fn check_items(
        conn: &mut PgConnection,
        (_, _, catalog): (&str, &str, &str),
        lines: &[OrderLineInput],
    ) -> Result<(), AppError> {
        if lines.is_empty() {
            return Ok(());
        }
        let ids: Vec<i32> = lines.iter().map(|l| l.id).collect();
        let sql = format!("SELECT id FROM {catalog} WHERE id = ANY($1)");
        let found: Vec<i32> = sqlx::query_scalar(&sql)
            .bind(&ids)
            .fetch_all(&mut *conn)
            .await?;
        let found: HashSet<i32> = found.into_iter().collect();
        match ids.iter().find(|id| !found.contains(id)) {
            Some(missing) => Err(AppError::BadRequest(format!(
                "Unknown item {} in {}.",
                missing, catalog
            ))),
            None => Ok(()),
        }
    }

    async fn insert_lines(
        conn: &mut PgConnection,
        (table, item, _): (&str, &str, &str),
        order_id: i32,
        lines: &[OrderLineInput],
    ) -> Result<(), AppError> {
        if lines.is_empty() {
            return Ok(());
        }
        let items: Vec<i32> = lines.iter().map(|l| l.id).collect();
        let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();
        let prices: Vec<i32> = lines.iter().map(|l| l.price).collect();
        let sql = format!(
            "INSERT INTO {table} (order_id, {item}, quantity, price) \
             SELECT $1, line.item, line.quantity, line.price \
             FROM UNNEST($2::int[], $3::int[], $4::int[]) AS line(item, quantity, price)"
        );
        sqlx::query(&sql)
            .bind(order_id)
            .bind(&items)
            .bind(&quantities)
            .bind(&prices)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
