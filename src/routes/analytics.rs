use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analytics::rollup;
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::validation::validate_date_range;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/metrics/series", get(metrics_series))
        .route("/metrics/rebuild", post(rebuild_metrics))
        .route("/revenue/month-compare", get(revenue_month_compare))
        .route("/paying-users/month", get(paying_users_month))
        .route(
            "/paying-users/month-compare",
            get(paying_users_month_compare),
        )
        .route("/orders/series", get(order_series))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateRangeQuery {
    start_date: String,
    end_date: String,
}

impl DateRangeQuery {
    fn validated(&self) -> Result<(), AppError> {
        validate_date_range(&self.start_date, &self.end_date)
            .map(|_| ())
            .map_err(|msg| AppError::bad_request("INVALID_DATE_RANGE", msg))
    }
}

async fn metrics_series(
    Query(q): Query<DateRangeQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    q.validated()?;
    let series = rollup::metrics_series(
        state.store(),
        &state.config().organization_id,
        &q.start_date,
        &q.end_date,
    )?;
    Ok(ok(series))
}

async fn revenue_month_compare(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let compare =
        rollup::revenue_month_compare(state.store(), &state.config().organization_id, Utc::now())?;
    Ok(ok(compare))
}

async fn paying_users_month(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let summary = rollup::paying_users_month_unique(
        state.store(),
        &state.config().organization_id,
        Utc::now(),
    )?;
    Ok(ok(summary))
}

async fn paying_users_month_compare(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let compare = rollup::paying_users_month_compare(
        state.store(),
        &state.config().organization_id,
        Utc::now(),
    )?;
    Ok(ok(compare))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderSeriesQuery {
    start_date: String,
    end_date: String,
    include_pending_paid: Option<bool>,
}

async fn order_series(
    Query(q): Query<OrderSeriesQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    validate_date_range(&q.start_date, &q.end_date)
        .map_err(|msg| AppError::bad_request("INVALID_DATE_RANGE", msg))?;
    let series = rollup::order_metrics_series(
        state.store(),
        &q.start_date,
        &q.end_date,
        q.include_pending_paid.unwrap_or(false),
    )?;
    Ok(ok(series))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RebuildRequest {
    start_date: String,
    end_date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RebuildResponse {
    rebuilt_days: usize,
    start_date: String,
    end_date: String,
}

async fn rebuild_metrics(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RebuildRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_date_range(&req.start_date, &req.end_date)
        .map_err(|msg| AppError::bad_request("INVALID_DATE_RANGE", msg))?;

    let rebuilt_days = rollup::rebuild_metrics_range(
        state.store(),
        &state.config().organization_id,
        &state.config().currency,
        &req.start_date,
        &req.end_date,
        Utc::now(),
    )?;

    tracing::info!(
        start_date = %req.start_date,
        end_date = %req.end_date,
        rebuilt_days,
        "Daily metrics rebuilt"
    );

    Ok(ok(RebuildResponse {
        rebuilt_days,
        start_date: req.start_date,
        end_date: req.end_date,
    }))
}
