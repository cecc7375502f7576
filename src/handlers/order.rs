//! Order handlers.

use crate::catalog::ListQuery;
use crate::error::AppError;
use crate::extractors::{JsonBody, LoggedUser};
use crate::handlers::parse_id;
use crate::models::OrderDetails;
use crate::response::{success_one, success_one_ok, Paginated, SuccessOne};
use crate::service::validation::{OrderBody, OrderStatusBody};
use crate::service::OrderService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<OrderDetails>>, AppError> {
    let query = ListQuery::from_pairs(&pairs);
    Ok(Json(OrderService::list(&state.pool, query.page).await?))
}

pub async fn create(
    State(state): State<AppState>,
    LoggedUser(user): LoggedUser,
    JsonBody(body): JsonBody<OrderBody>,
) -> Result<(StatusCode, Json<SuccessOne<OrderDetails>>), AppError> {
    let input = body.validate()?;
    let order = OrderService::create(&state.pool, input).await?;
    tracing::debug!(user_id = user.id, order_id = order.order.id, "order placed");
    Ok(success_one(order))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    JsonBody(body): JsonBody<OrderStatusBody>,
) -> Result<(StatusCode, Json<SuccessOne<OrderDetails>>), AppError> {
    let id = parse_id(&order_id)?;
    let status = body.validate()?;
    let order = OrderService::update_status(&state.pool, id, &status).await?;
    Ok(success_one_ok(order))
}
