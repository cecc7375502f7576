//! Builds WHERE / ORDER BY clauses for product and package listings.
//! Identifiers come from this module only; user values are always bound.

use crate::catalog::{Availability, ListQuery};
use crate::models::STATUS_ACTIVE;
use sqlx::{Postgres, QueryBuilder};

/// Product columns; NUMERIC dimensions come back as float8.
pub const PRODUCT_COLUMNS: &str = "p.id, p.name, p.width::float8 AS width, \
     p.height::float8 AS height, p.depth::float8 AS depth, p.stock, p.price, p.old_price, \
     p.status, p.slug, p.created";

pub const PACKAGE_COLUMNS: &str =
    "k.id, k.name, k.category_id, k.stock, k.price, k.old_price, k.status, k.slug, k.created";

/// Which filters a listing applies, beyond the shared search/availability ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterScope {
    pub active_only: bool,
}

/// `WHERE ...` for `products p`. Category filter matches any of the ids.
pub fn push_product_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    query: &ListQuery,
    scope: FilterScope,
) {
    qb.push(" WHERE TRUE");
    if scope.active_only {
        qb.push(" AND p.status = ").push_bind(STATUS_ACTIVE);
    }
    push_common(qb, "p", query);
    if let Some(ids) = &query.categories {
        qb.push(
            " AND EXISTS (SELECT 1 FROM products_categories pc \
             WHERE pc.product_id = p.id AND pc.category_id = ANY(",
        )
        .push_bind(ids.clone())
        .push("))");
    }
}

/// `WHERE ...` for `packages k`.
pub fn push_package_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    query: &ListQuery,
    scope: FilterScope,
) {
    qb.push(" WHERE TRUE");
    if scope.active_only {
        qb.push(" AND k.status = ").push_bind(STATUS_ACTIVE);
    }
    push_common(qb, "k", query);
    if let Some(ids) = &query.categories {
        qb.push(" AND k.category_id = ANY(").push_bind(ids.clone()).push(")");
    }
}

fn push_common(qb: &mut QueryBuilder<'_, Postgres>, alias: &'static str, query: &ListQuery) {
    if let Some(search) = &query.search {
        qb.push(format!(" AND {alias}.name ILIKE "))
            .push_bind(like_pattern(search));
    }
    match query.availability {
        Some(Availability::InStock) => {
            qb.push(format!(" AND {alias}.stock <> 0"));
        }
        Some(Availability::OutOfStock) => {
            qb.push(format!(" AND {alias}.stock = 0"));
        }
        None => {}
    }
}

/// `%term%` with LIKE wildcards in the term escaped.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub fn push_limit_offset(qb: &mut QueryBuilder<'_, Postgres>, limit: u64, offset: u64) {
    qb.push(" LIMIT ")
        .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .push(" OFFSET ")
        .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ListQuery;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ListQuery::from_pairs(&pairs)
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(like_pattern("orc"), "%orc%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn product_filters_bind_user_values() {
        let q = query(&[("search", "elf"), ("availability", "yes"), ("categories[]", "2")]);
        let mut qb = QueryBuilder::<Postgres>::new("SELECT p.id FROM products p");
        push_product_filters(&mut qb, &q, FilterScope { active_only: true });
        let sql = qb.sql();
        assert!(sql.contains("p.status = $1"));
        assert!(sql.contains("p.name ILIKE $2"));
        assert!(sql.contains("p.stock <> 0"));
        assert!(sql.contains("pc.category_id = ANY($3)"));
        assert!(!sql.contains("elf"));
    }

    #[test]
    fn package_filters_without_scope() {
        let q = query(&[("availability", "no"), ("categories", "4")]);
        let mut qb = QueryBuilder::<Postgres>::new("SELECT k.id FROM packages k");
        push_package_filters(&mut qb, &q, FilterScope::default());
        let sql = qb.sql();
        assert!(!sql.contains("status"));
        assert!(sql.contains("k.stock = 0"));
        assert!(sql.contains("k.category_id = ANY($1)"));
    }
}
