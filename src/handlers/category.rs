//! Category handlers.

use crate::catalog::ListQuery;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::handlers::parse_id;
use crate::models::{Category, CategorySummary};
use crate::response::{created, Message, Paginated};
use crate::service::validation::CategoryBody;
use crate::service::CategoryService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// `GET /categories?page&perPage&search`
pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<CategorySummary>>, AppError> {
    let query = ListQuery::from_pairs(&pairs);
    let page = CategoryService::list(&state.pool, query.page, query.search.as_deref()).await?;
    Ok(Json(page))
}

pub async fn all(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(CategoryService::all(&state.pool).await?))
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CategoryBody>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let input = body.validate()?;
    CategoryService::create(&state.pool, input).await?;
    Ok(created("Category created!"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    JsonBody(body): JsonBody<CategoryBody>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let id = parse_id(&category_id)?;
    let input = body.validate()?;
    CategoryService::update(&state.pool, id, input).await?;
    Ok(created("Category updated!"))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&category_id)?;
    CategoryService::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
