//! Figurine feed: products and packages merged into one ordered, paginated list.
//!
//! Both sides are queried independently (already filtered), then sorted together
//! in memory and sliced to the requested page.

use crate::catalog::query::{FeedOrder, Page};
use crate::models::{PackageDetails, ProductDetails};
use crate::response::Paginated;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// Number of items on the storefront "latest" strip.
pub const LATEST_LIMIT: usize = 8;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedItem {
    Product(ProductDetails),
    Package(PackageDetails),
}

impl FeedItem {
    pub fn name(&self) -> &str {
        match self {
            FeedItem::Product(p) => &p.product.name,
            FeedItem::Package(p) => &p.package.name,
        }
    }

    pub fn price(&self) -> i32 {
        match self {
            FeedItem::Product(p) => p.product.price,
            FeedItem::Package(p) => p.package.price,
        }
    }

    pub fn created(&self) -> DateTime<Utc> {
        match self {
            FeedItem::Product(p) => p.product.created,
            FeedItem::Package(p) => p.package.created,
        }
    }
}

fn compare(a: &FeedItem, b: &FeedItem, order: FeedOrder) -> Ordering {
    match order {
        FeedOrder::Recent => b.created().cmp(&a.created()),
        FeedOrder::Name => a
            .name()
            .to_lowercase()
            .cmp(&b.name().to_lowercase())
            .then_with(|| a.name().cmp(b.name())),
        FeedOrder::PriceAsc => a.price().cmp(&b.price()),
        FeedOrder::PriceDesc => b.price().cmp(&a.price()),
    }
}

/// Concatenates products then packages and sorts stably, so equal keys keep query order.
fn merged(
    products: Vec<ProductDetails>,
    packages: Vec<PackageDetails>,
    order: FeedOrder,
) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = products
        .into_iter()
        .map(FeedItem::Product)
        .chain(packages.into_iter().map(FeedItem::Package))
        .collect();
    items.sort_by(|a, b| compare(a, b, order));
    items
}

/// Merge both collections, order them, and cut out one page.
/// `count` is the size of the merged set before slicing.
pub fn merge_and_paginate(
    products: Vec<ProductDetails>,
    packages: Vec<PackageDetails>,
    order: FeedOrder,
    page: Page,
) -> Paginated<FeedItem> {
    let items = merged(products, packages, order);
    let count = items.len() as u64;
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let take = page.per_page as usize;
    let page_items = items.into_iter().skip(skip).take(take).collect();
    Paginated::new(page_items, count, page.per_page)
}

/// Most recent items across both types, at most [`LATEST_LIMIT`].
pub fn merge_latest(products: Vec<ProductDetails>, packages: Vec<PackageDetails>) -> Vec<FeedItem> {
    let mut items = merged(products, packages, FeedOrder::Recent);
    items.truncate(LATEST_LIMIT);
    items
}

/// Everything, newest first. Used by the admin overview.
pub fn merge_all(products: Vec<ProductDetails>, packages: Vec<PackageDetails>) -> Vec<FeedItem> {
    merged(products, packages, FeedOrder::Recent)
}
