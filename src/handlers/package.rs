//! Package handlers.

use crate::catalog::ListQuery;
use crate::error::AppError;
use crate::extractors::FormData;
use crate::handlers::parse_id;
use crate::models::{Package, PackageDetails};
use crate::response::{created, Message, Paginated};
use crate::service::validation::PackageInput;
use crate::service::PackageService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// `GET /packages?page&perPage&search&categories[]&availability&orderBy`
pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<PackageDetails>>, AppError> {
    let query = ListQuery::from_pairs(&pairs);
    Ok(Json(PackageService::list(&state.pool, &query).await?))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<Vec<Package>>, AppError> {
    Ok(Json(PackageService::stats(&state.pool).await?))
}

pub async fn by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PackageDetails>, AppError> {
    Ok(Json(PackageService::by_slug(&state.pool, &slug).await?))
}

pub async fn create(
    State(state): State<AppState>,
    form: FormData,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let input = PackageInput::from_form(&form)?;
    PackageService::create(&state.pool, &state.images, input, &form.files).await?;
    Ok(created("Package created!"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
    form: FormData,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let id = parse_id(&package_id)?;
    let input = PackageInput::from_form(&form)?;
    PackageService::update(&state.pool, &state.images, id, input, &form.files).await?;
    Ok(created("Package updated!"))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&package_id)?;
    PackageService::delete(&state.pool, &state.images, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_image(
    State(state): State<AppState>,
    Path((package_id, image_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&package_id)?;
    let image_id = parse_id(&image_id)?;
    PackageService::delete_image(&state.pool, &state.images, id, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
