use axum::http::Method;
use axum::Router;
use serde_json::Value;

use super::http::{request, response_json};

/// Create a question set over HTTP and return its uid.
///
/// Question 0 has a single answer mapping (trackable), question 1 has two
/// (multi-part, skipped by the tracker), question 2 has none.
pub async fn seed_question_set(app: &Router, title: &str) -> String {
    let resp = request(
        app,
        Method::POST,
        "/api/question-sets",
        Some(serde_json::json!({
            "title": title,
            "questions": [
                {
                    "htmlContent": "<p>What is 2+2?</p>",
                    "answerMapping": [
                        {"selector": "#q0", "correctValue": "4", "explanation": "basic sum"}
                    ]
                },
                {
                    "htmlContent": "<p>Match the pairs</p>",
                    "answerMapping": [
                        {"selector": "#q1a", "correctValue": "A", "explanation": ""},
                        {"selector": "#q1b", "correctValue": "B", "explanation": ""}
                    ]
                },
                {
                    "htmlContent": "<p>Free text</p>",
                    "answerMapping": []
                }
            ]
        })),
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert!(status.is_success(), "seed question set failed: {body}");
    body["data"]["meta"]["uid"]
        .as_str()
        .expect("question set uid")
        .to_string()
}

/// Create a pending order over HTTP and return the order JSON.
pub async fn seed_order(app: &Router, user_id: &str, final_price: i64) -> Value {
    let resp = request(
        app,
        Method::POST,
        "/api/orders",
        Some(serde_json::json!({
            "userId": user_id,
            "finalPrice": final_price,
        })),
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert!(status.is_success(), "seed order failed: {body}");
    body["data"].clone()
}

/// Complete an order over HTTP, triggering the metrics rollup.
pub async fn complete_order(app: &Router, order_id: &str) -> Value {
    let resp = request(
        app,
        Method::POST,
        &format!("/api/orders/{order_id}/complete"),
        None,
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert!(status.is_success(), "complete order failed: {body}");
    body["data"].clone()
}
