//! Row types for the catalog schema and the shapes returned to clients.

mod catalog;
mod order;
mod user;

pub use catalog::*;
pub use order::*;
pub use user::*;

/// `active` / `inactive` status shared by products, packages and categories.
pub const ITEM_STATUSES: &[&str] = &["active", "inactive"];
pub const STATUS_ACTIVE: &str = "active";
