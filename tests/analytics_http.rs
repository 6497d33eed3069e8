mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;

use common::app::spawn_test_server;
use common::fixtures::{complete_order, seed_order};
use common::http::{assert_json_error, assert_status_ok_json, request, response_json};

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

#[tokio::test]
async fn it_completed_orders_roll_into_daily_metrics() {
    let app = spawn_test_server().await;
    let day = today();

    // Two orders from the same user on the same day
    let o1 = seed_order(&app.app, "u1", 100_000).await;
    let o2 = seed_order(&app.app, "u1", 50_000).await;
    complete_order(&app.app, o1["id"].as_str().unwrap()).await;
    complete_order(&app.app, o2["id"].as_str().unwrap()).await;

    let resp = request(
        &app.app,
        Method::GET,
        &format!("/api/analytics/metrics/series?startDate={day}&endDate={day}"),
        None,
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);

    let series = body["data"].as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["date"], day);
    assert_eq!(series[0]["revenue"], 150_000);
    assert_eq!(series[0]["orderCount"], 2);
    // Same payer twice on one day counts once
    assert_eq!(series[0]["payingUsers"], 1);
}

#[tokio::test]
async fn it_order_completion_flow_sets_status_and_payment() {
    let app = spawn_test_server().await;

    let order = seed_order(&app.app, "u1", 42_000).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["paymentStatus"], "unpaid");

    let completed = complete_order(&app.app, order["id"].as_str().unwrap()).await;
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["paymentStatus"], "paid");

    let resp = request(
        &app.app,
        Method::GET,
        &format!("/api/orders/{}", order["id"].as_str().unwrap()),
        None,
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
}

#[tokio::test]
async fn it_repeated_completion_counts_the_order_once() {
    let app = spawn_test_server().await;
    let day = today();

    let order = seed_order(&app.app, "u1", 100_000).await;
    let id = order["id"].as_str().unwrap();

    // A retried completion (payment callback redelivery) must be a no-op
    let first = complete_order(&app.app, id).await;
    let second = complete_order(&app.app, id).await;
    assert_eq!(first["status"], "completed");
    assert_eq!(second["status"], "completed");

    let resp = request(
        &app.app,
        Method::GET,
        &format!("/api/analytics/metrics/series?startDate={day}&endDate={day}"),
        None,
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);

    let series = body["data"].as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["revenue"], 100_000);
    assert_eq!(series[0]["orderCount"], 1);
    assert_eq!(series[0]["payingUsers"], 1);
}

#[tokio::test]
async fn it_completing_missing_order_is_404() {
    let app = spawn_test_server().await;

    let resp = request(
        &app.app,
        Method::POST,
        "/api/orders/ghost/complete",
        None,
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");
}

#[tokio::test]
async fn it_rebuild_reconciles_drifted_metrics() {
    let app = spawn_test_server().await;
    let day = today();

    let o1 = seed_order(&app.app, "u1", 100_000).await;
    complete_order(&app.app, o1["id"].as_str().unwrap()).await;

    // Drift the derived row out from under the order log
    let metric = app
        .state
        .store()
        .get_daily_metric("default", &day)
        .unwrap()
        .expect("metric row");
    let mut drifted = metric.clone();
    drifted.revenue = 999_999;
    drifted.order_count = 42;
    app.state.store().put_daily_metric(&drifted).unwrap();

    let resp = request(
        &app.app,
        Method::POST,
        "/api/analytics/metrics/rebuild",
        Some(serde_json::json!({"startDate": day, "endDate": day})),
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["rebuiltDays"], 1);

    let rebuilt = app
        .state
        .store()
        .get_daily_metric("default", &day)
        .unwrap()
        .expect("rebuilt row");
    assert_eq!(rebuilt.revenue, 100_000);
    assert_eq!(rebuilt.order_count, 1);
    assert_eq!(rebuilt.paying_users, 1);
}

#[tokio::test]
async fn it_month_compare_reports_zero_baseline_growth() {
    let app = spawn_test_server().await;

    let o1 = seed_order(&app.app, "u1", 80_000).await;
    complete_order(&app.app, o1["id"].as_str().unwrap()).await;

    let resp = request(
        &app.app,
        Method::GET,
        "/api/analytics/revenue/month-compare",
        None,
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["currentMonthRevenue"], 80_000);
    assert_eq!(body["data"]["previousMonthRevenue"], 0);
    // No prior-month data: reported as 100% growth
    assert_eq!(body["data"]["deltaPct"], 100.0);
}

#[tokio::test]
async fn it_paying_users_month_counts_distinct_users() {
    let app = spawn_test_server().await;

    for user in ["u1", "u1", "u2"] {
        let order = seed_order(&app.app, user, 10_000).await;
        complete_order(&app.app, order["id"].as_str().unwrap()).await;
    }

    let resp = request(
        &app.app,
        Method::GET,
        "/api/analytics/paying-users/month",
        None,
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["payingUsersMonth"], 2);
}

#[tokio::test]
async fn it_order_series_counts_pending_paid_when_asked() {
    let app = spawn_test_server().await;
    let day = today();

    let completed = seed_order(&app.app, "u1", 100_000).await;
    complete_order(&app.app, completed["id"].as_str().unwrap()).await;

    // A paid order stuck in pending (webhook raced the status update)
    let stuck = seed_order(&app.app, "u2", 40_000).await;
    app.state
        .store()
        .set_order_status(stuck["id"].as_str().unwrap(), "pending", "paid")
        .unwrap();

    let base = format!("/api/analytics/orders/series?startDate={day}&endDate={day}");
    let resp = request(&app.app, Method::GET, &base, None, &[]).await;
    let (_, _, body) = response_json(resp).await;
    assert_eq!(body["data"][0]["revenue"], 100_000);

    let with_pending = format!("{base}&includePendingPaid=true");
    let resp = request(&app.app, Method::GET, &with_pending, None, &[]).await;
    let (_, _, body) = response_json(resp).await;
    assert_eq!(body["data"][0]["revenue"], 140_000);
    assert_eq!(body["data"][0]["payingUsers"], 2);
}

#[tokio::test]
async fn it_rejects_invalid_date_ranges() {
    let app = spawn_test_server().await;

    let resp = request(
        &app.app,
        Method::GET,
        "/api/analytics/metrics/series?startDate=2025-03-10&endDate=2025-03-01",
        None,
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_DATE_RANGE");

    let resp = request(
        &app.app,
        Method::POST,
        "/api/analytics/metrics/rebuild",
        Some(serde_json::json!({"startDate": "03/10/2025", "endDate": "2025-03-11"})),
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_DATE_RANGE");
}

#[tokio::test]
async fn it_empty_range_yields_empty_series() {
    let app = spawn_test_server().await;

    let resp = request(
        &app.app,
        Method::GET,
        "/api/analytics/metrics/series?startDate=2001-01-01&endDate=2001-01-31",
        None,
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!([]));
}
