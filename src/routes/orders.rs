use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::analytics::rollup::increment_daily_metrics_for_order;
use crate::constants::{
    ORDER_STATUS_COMPLETED, ORDER_STATUS_PENDING, PAYMENT_STATUS_PAID, PAYMENT_STATUS_UNPAID,
};
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::orders::Order;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/complete", post(complete_order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderRequest {
    user_id: String,
    final_price: Option<i64>,
    total_price: Option<i64>,
}

async fn create_order(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::bad_request(
            "VALIDATION_ERROR",
            "userId must not be empty",
        ));
    }

    let order = Order {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: req.user_id,
        status: ORDER_STATUS_PENDING.to_string(),
        payment_status: PAYMENT_STATUS_UNPAID.to_string(),
        final_price: req.final_price,
        total_price: req.total_price,
        created_at: Utc::now().timestamp(),
    };
    state.store().create_order(&order)?;
    Ok(created(order))
}

async fn get_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let order = state
        .store()
        .get_order(&id)?
        .ok_or_else(|| AppError::not_found(&format!("Order not found: {id}")))?;
    Ok(ok(order))
}

/// Mark an order completed and paid, then fold it into the daily metrics.
/// The rollup is best-effort: the completion succeeds even if it fails.
async fn complete_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<axum::response::Response, AppError> {
    let existing = state
        .store()
        .get_order(&id)?
        .ok_or_else(|| AppError::not_found(&format!("Order not found: {id}")))?;

    // 重复的 complete 调用（如支付回调重试）只读返回，不再次累计指标
    if existing.status == ORDER_STATUS_COMPLETED {
        return Ok(ok(existing).into_response());
    }

    let order = state
        .store()
        .set_order_status(&id, ORDER_STATUS_COMPLETED, PAYMENT_STATUS_PAID)?;

    increment_daily_metrics_for_order(
        state.store(),
        &state.config().organization_id,
        &state.config().currency,
        &order,
        Utc::now(),
    );

    Ok(ok(order).into_response())
}
