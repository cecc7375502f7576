//! Catalog routes: categories, products, packages and orders.
//! A path shared by a public read and admin writes guards each method separately.

use crate::handlers::{category, order, package, product};
use crate::routes::{admin_only, authenticated};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub fn category_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(category::list).merge(admin_only(state, post(category::create))),
        )
        .route("/categories/all", get(category::all))
        .route(
            "/categories/:category_id",
            admin_only(state, put(category::update).delete(category::delete)),
        )
}

pub fn product_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            admin_only(state, get(product::list).post(product::create)),
        )
        .route("/products/all", admin_only(state, get(product::all)))
        .route("/products/stats", admin_only(state, get(product::stats)))
        .route(
            "/products/allProductsAndPackages",
            admin_only(state, get(product::all_products_and_packages)),
        )
        .route("/products/figurine", get(product::figurine))
        .route("/products/latest", get(product::latest))
        .route(
            "/products/:product",
            get(product::by_slug).merge(admin_only(
                state,
                put(product::update).delete(product::delete),
            )),
        )
        .route(
            "/products/:product/image/:image_id",
            admin_only(state, delete(product::delete_image)),
        )
}

pub fn package_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/packages",
            admin_only(state, get(package::list).post(package::create)),
        )
        .route("/packages/stats", admin_only(state, get(package::stats)))
        .route(
            "/packages/:package",
            get(package::by_slug).merge(admin_only(
                state,
                put(package::update).delete(package::delete),
            )),
        )
        .route(
            "/packages/:package/image/:image_id",
            admin_only(state, delete(package::delete_image)),
        )
}

pub fn order_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            admin_only(state, get(order::list)).merge(authenticated(state, post(order::create))),
        )
        .route("/orders/:order_id/status", admin_only(state, put(order::update_status)))
}
