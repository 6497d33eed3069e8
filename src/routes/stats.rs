use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analytics::window::StatsWindow;
use crate::analytics::wrong_answers::{get_top_wrong_questions, record_wrong_answers};
use crate::constants::MAX_WRONG_ANSWER_BATCH;
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::question_stats::QuestionStat;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wrong-answers", post(track_wrong_answers))
        .route("/top-wrong", get(top_wrong_questions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackWrongAnswersRequest {
    user_id: String,
    question_set_id: String,
    question_ids: Vec<String>,
    collection_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackWrongAnswersResponse {
    updated: usize,
    updated_ids: Vec<String>,
    errors: Vec<String>,
    partial: bool,
}

async fn track_wrong_answers(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TrackWrongAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.question_ids.is_empty() {
        return Err(AppError::bad_request(
            "EMPTY_BATCH",
            "questionIds must not be empty",
        ));
    }
    if req.question_ids.len() > MAX_WRONG_ANSWER_BATCH {
        return Err(AppError::bad_request(
            "BATCH_TOO_LARGE",
            &format!("questionIds must not exceed {MAX_WRONG_ANSWER_BATCH} entries"),
        ));
    }

    let outcome = record_wrong_answers(
        state.store(),
        state.blobs(),
        &req.user_id,
        &req.question_set_id,
        &req.question_ids,
        req.collection_id.as_deref(),
        Utc::now(),
    )?;

    let partial = outcome.is_partial();
    Ok(ok(TrackWrongAnswersResponse {
        updated: outcome.updated,
        updated_ids: outcome.updated_ids,
        errors: outcome.errors,
        partial,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopWrongQuery {
    period: Option<String>,
    // Accepted for API compatibility; the server-side cap always wins.
    #[allow(dead_code)]
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TopWrongResponse {
    bucket: String,
    questions: Vec<QuestionStat>,
}

async fn top_wrong_questions(
    Query(q): Query<TopWrongQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let period = match q.period.as_deref() {
        None => StatsWindow::All,
        Some(raw) => raw.parse::<StatsWindow>().map_err(|_| {
            AppError::bad_request("INVALID_PERIOD", "period must be one of all, week, month")
        })?,
    };

    let (bucket, questions) = get_top_wrong_questions(state.store(), period, Utc::now())?;
    Ok(ok(TopWrongResponse { bucket, questions }))
}
