//! Storefront listings that mix products and packages.

use crate::catalog::{merge_all, merge_and_paginate, merge_latest, FeedItem, ItemType, ListQuery};
use crate::error::AppError;
use crate::response::Paginated;
use crate::service::packages::PackageService;
use crate::service::products::ProductService;
use sqlx::PgPool;

pub struct FeedService;

impl FeedService {
    /// The figurine feed. `type` restricts the listing to one side.
    pub async fn figurines(
        pool: &PgPool,
        query: &ListQuery,
    ) -> Result<Paginated<FeedItem>, AppError> {
        let mut conn = pool.acquire().await?;
        let products = if query.includes(ItemType::Product) {
            ProductService::feed(&mut conn, query).await?
        } else {
            Vec::new()
        };
        let packages = if query.includes(ItemType::Package) {
            PackageService::feed(&mut conn, query).await?
        } else {
            Vec::new()
        };
        tracing::debug!(products = products.len(), packages = packages.len(), "feed candidates");
        Ok(merge_and_paginate(
            products,
            packages,
            query.order_by.unwrap_or_default(),
            query.page,
        ))
    }

    pub async fn latest(pool: &PgPool) -> Result<Vec<FeedItem>, AppError> {
        let mut conn = pool.acquire().await?;
        let products = ProductService::latest(&mut conn).await?;
        let packages = PackageService::latest(&mut conn).await?;
        Ok(merge_latest(products, packages))
    }

    /// Every product and package regardless of status, newest first.
    pub async fn everything(pool: &PgPool) -> Result<Vec<FeedItem>, AppError> {
        let products = ProductService::all(pool).await?;
        let packages = PackageService::all(pool).await?;
        Ok(merge_all(products, packages))
    }
}
