use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::collections::Collection;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_collection))
        .route("/:id", get(get_collection))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCollectionRequest {
    name: String,
    #[serde(default)]
    question_sets: Vec<String>,
}

async fn create_collection(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateCollectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::bad_request(
            "VALIDATION_ERROR",
            "name must not be empty",
        ));
    }

    let collection = Collection {
        uid: uuid::Uuid::new_v4().to_string(),
        name: req.name,
        question_sets: req.question_sets,
        created_at: Utc::now(),
    };
    state.store().upsert_collection(&collection)?;
    Ok(created(collection))
}

async fn get_collection(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let collection = state
        .store()
        .get_collection(&id)?
        .ok_or_else(|| AppError::not_found(&format!("Collection not found: {id}")))?;
    Ok(ok(collection))
}
