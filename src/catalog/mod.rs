//! Catalog logic that runs in memory: query parsing, feed merging, slugs, image order.

pub mod feed;
pub mod ordering;
pub mod query;
pub mod slug;

pub use feed::{merge_all, merge_and_paginate, merge_latest, FeedItem, LATEST_LIMIT};
pub use ordering::{
    compact_after_removal, parse_images_order, positions_for_uploads, reorder_existing, ImagesOrder,
};
pub use query::{Availability, FeedOrder, ItemType, ListQuery, Page, SortColumn, SortDirection};
pub use slug::{generate_slug, unique_slug};
