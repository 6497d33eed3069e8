use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analytics::wrong_answers::{QuestionContent, QuestionSetContent};
use crate::blob::question_set_blob_key;
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::question_sets::QuestionSetMeta;
use crate::validation::validate_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_question_set))
        .route("/:id", get(get_question_set))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateQuestionSetRequest {
    title: String,
    #[serde(default)]
    questions: Vec<QuestionContent>,
    collection_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionSetResponse {
    meta: QuestionSetMeta,
    content: QuestionSetContent,
}

async fn create_question_set(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateQuestionSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::bad_request(
            "VALIDATION_ERROR",
            "title must not be empty",
        ));
    }

    let uid = uuid::Uuid::new_v4().to_string();
    let blob_key = question_set_blob_key(&uid);
    let content = QuestionSetContent {
        title: req.title.clone(),
        questions: req.questions,
    };
    state.blobs().put_json(&blob_key, &content)?;

    let meta = QuestionSetMeta {
        uid: uid.clone(),
        title: req.title,
        blob_key,
        question_count: content.questions.len() as u64,
        created_at: Utc::now(),
    };
    state.store().upsert_question_set(&meta)?;

    if let Some(collection_id) = req.collection_id.as_deref() {
        validate_id(collection_id)
            .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;
        state
            .store()
            .attach_question_set_to_collection(collection_id, &uid)?;
    }

    Ok(created(QuestionSetResponse { meta, content }))
}

async fn get_question_set(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let meta = state
        .store()
        .get_question_set(&id)?
        .ok_or_else(|| AppError::not_found(&format!("Question set not found: {id}")))?;
    let content: QuestionSetContent = state.blobs().get_json(&meta.blob_key)?;
    Ok(ok(QuestionSetResponse { meta, content }))
}
