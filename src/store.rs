//! Database bootstrap: create the database, the catalog tables, and seed roles.

use crate::auth::hash_password;
use crate::error::{AppError, ConfigError};
use crate::models::{ROLES, ROLE_ADMIN};
use crate::service::blocking;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Catalog DDL, applied in order. Every statement is idempotent.
const TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS user_roles (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ
    )"#,
    r#"CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        token TEXT,
        role_id INTEGER NOT NULL REFERENCES user_roles(id),
        status TEXT NOT NULL DEFAULT 'active'
            CHECK (status IN ('active', 'pending', 'inactive', 'deleted')),
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ
    )"#,
    r#"CREATE TABLE IF NOT EXISTS categories (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ
    )"#,
    r#"CREATE TABLE IF NOT EXISTS products (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        width NUMERIC(4,1) NOT NULL,
        height NUMERIC(4,1) NOT NULL,
        depth NUMERIC(4,1) NOT NULL,
        stock INTEGER NOT NULL,
        price INTEGER NOT NULL,
        old_price INTEGER,
        status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
        slug TEXT NOT NULL UNIQUE,
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ
    )"#,
    r#"CREATE TABLE IF NOT EXISTS products_categories (
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        PRIMARY KEY (product_id, category_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS product_images (
        id SERIAL PRIMARY KEY,
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        filename VARCHAR(150) NOT NULL,
        position INTEGER NOT NULL,
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ,
        CONSTRAINT product_images_position_key UNIQUE (product_id, position)
            DEFERRABLE INITIALLY DEFERRED
    )"#,
    r#"CREATE TABLE IF NOT EXISTS packages (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        category_id INTEGER NOT NULL REFERENCES categories(id),
        stock INTEGER NOT NULL,
        price INTEGER NOT NULL,
        old_price INTEGER,
        status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
        slug TEXT NOT NULL UNIQUE,
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ
    )"#,
    r#"CREATE TABLE IF NOT EXISTS package_products (
        id SERIAL PRIMARY KEY,
        package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
        product_id INTEGER NOT NULL REFERENCES products(id),
        quantity INTEGER NOT NULL,
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ,
        UNIQUE (package_id, product_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS package_images (
        id SERIAL PRIMARY KEY,
        package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
        filename VARCHAR(150) NOT NULL,
        position INTEGER NOT NULL,
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ,
        CONSTRAINT package_images_position_key UNIQUE (package_id, position)
            DEFERRABLE INITIALLY DEFERRED
    )"#,
    r#"CREATE TABLE IF NOT EXISTS orders (
        id SERIAL PRIMARY KEY,
        date TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'working', 'finished')),
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ
    )"#,
    r#"CREATE TABLE IF NOT EXISTS order_products (
        id SERIAL PRIMARY KEY,
        order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        product_id INTEGER NOT NULL REFERENCES products(id),
        quantity INTEGER NOT NULL,
        price INTEGER NOT NULL,
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ
    )"#,
    r#"CREATE TABLE IF NOT EXISTS order_packages (
        id SERIAL PRIMARY KEY,
        order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        package_id INTEGER NOT NULL REFERENCES packages(id),
        quantity INTEGER NOT NULL,
        price INTEGER NOT NULL,
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ
    )"#,
    "CREATE INDEX IF NOT EXISTS products_status_idx ON products (status)",
    "CREATE INDEX IF NOT EXISTS packages_status_idx ON packages (status)",
    "CREATE INDEX IF NOT EXISTS packages_category_idx ON packages (category_id)",
];

/// Create every catalog table that does not exist yet.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), AppError> {
    for ddl in TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(tables = TABLES.len(), "schema ready");
    Ok(())
}

/// Insert the `user` and `admin` roles, plus an admin account when credentials are given.
pub async fn seed(pool: &PgPool, admin: Option<(&str, &str)>) -> Result<(), AppError> {
    for role in ROLES {
        sqlx::query("INSERT INTO user_roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(*role)
            .execute(pool)
            .await?;
    }

    if let Some((email, password)) = admin {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
        if !exists.0 {
            let password = password.to_string();
            let hash = blocking(move || hash_password(&password)).await?;
            sqlx::query(
                "INSERT INTO users (email, password, role_id) \
                 SELECT $1, $2, id FROM user_roles WHERE name = $3",
            )
            .bind(email)
            .bind(hash)
            .bind(ROLE_ADMIN)
            .execute(pool)
            .await?;
            tracing::info!(email, "seeded admin user");
        }
    }
    Ok(())
}

/// Connect to the server's `postgres` database and create the target database if missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| ConfigError::Invalid {
            key: "DATABASE_URL",
            message: e.to_string(),
        })?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| ConfigError::Invalid {
            key: "DATABASE_URL",
            message: "no database path".into(),
        })?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_database_name() {
        let url = "postgres://u:p@db:5432/figurines?sslmode=disable";
        let (admin, name) = parse_db_name_from_url(url).unwrap();
        assert_eq!(admin, "postgres://u:p@db:5432/postgres");
        assert_eq!(name, "figurines");
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("shop"), "\"shop\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn every_table_statement_is_idempotent() {
        assert!(TABLES.iter().all(|ddl| ddl.contains("IF NOT EXISTS")));
    }
}
