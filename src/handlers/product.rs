//! Product handlers: admin management plus the storefront feed and detail pages.

use crate::catalog::{FeedItem, ListQuery};
use crate::error::AppError;
use crate::extractors::FormData;
use crate::handlers::parse_id;
use crate::models::{Product, ProductDetails};
use crate::response::{created, Message, Paginated};
use crate::service::validation::ProductInput;
use crate::service::{FeedService, ProductService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// `GET /products?page&perPage&search&categories[]&availability&sortBy&order`
pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<ProductDetails>>, AppError> {
    let query = ListQuery::from_pairs(&pairs);
    Ok(Json(ProductService::list(&state.pool, &query).await?))
}

pub async fn all(State(state): State<AppState>) -> Result<Json<Vec<ProductDetails>>, AppError> {
    Ok(Json(ProductService::all(&state.pool).await?))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(ProductService::stats(&state.pool).await?))
}

pub async fn all_products_and_packages(
    State(state): State<AppState>,
) -> Result<Json<Vec<FeedItem>>, AppError> {
    Ok(Json(FeedService::everything(&state.pool).await?))
}

/// `GET /products/figurine` with the shared filters plus `type` and `orderBy`.
pub async fn figurine(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<FeedItem>>, AppError> {
    let query = ListQuery::from_pairs(&pairs);
    Ok(Json(FeedService::figurines(&state.pool, &query).await?))
}

pub async fn latest(State(state): State<AppState>) -> Result<Json<Vec<FeedItem>>, AppError> {
    Ok(Json(FeedService::latest(&state.pool).await?))
}

pub async fn by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetails>, AppError> {
    Ok(Json(ProductService::by_slug(&state.pool, &slug).await?))
}

pub async fn create(
    State(state): State<AppState>,
    form: FormData,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let input = ProductInput::from_form(&form, true)?;
    ProductService::create(&state.pool, &state.images, input, &form.files).await?;
    Ok(created("Product created!"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    form: FormData,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let id = parse_id(&product_id)?;
    let input = ProductInput::from_form(&form, false)?;
    ProductService::update(&state.pool, &state.images, id, input, &form.files).await?;
    Ok(created("Product updated!"))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&product_id)?;
    ProductService::delete(&state.pool, &state.images, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_image(
    State(state): State<AppState>,
    Path((product_id, image_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&product_id)?;
    let image_id = parse_id(&image_id)?;
    ProductService::delete_image(&state.pool, &state.images, id, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
