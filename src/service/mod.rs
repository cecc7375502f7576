//! Services: database work for each resource, called by the handlers.

mod categories;
mod feed;
pub mod gallery;
mod orders;
mod packages;
mod products;
mod shared;
mod users;
pub mod validation;

pub use categories::CategoryService;
pub use feed::FeedService;
pub use orders::OrderService;
pub use packages::{PackageService, EMPTY_PACKAGE_MSG, INVALID_CATEGORY_MSG};
pub use products::ProductService;
pub use shared::blocking;
pub use users::{UserService, INVALID_CREDENTIALS_MSG};
pub use validation::RequestValidator;
