use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// Metadata row for a question set. The question content itself lives in the
/// blob store under `blob_key`; this row is only the pointer plus the fields
/// needed for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSetMeta {
    pub uid: String,
    pub title: String,
    pub blob_key: String,
    pub question_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn upsert_question_set(&self, meta: &QuestionSetMeta) -> Result<(), StoreError> {
        let key = keys::question_set_key(&meta.uid);
        self.question_sets
            .insert(key.as_bytes(), Self::serialize(meta)?)?;
        Ok(())
    }

    pub fn get_question_set(
        &self,
        question_set_id: &str,
    ) -> Result<Option<QuestionSetMeta>, StoreError> {
        let key = keys::question_set_key(question_set_id);
        match self.question_sets.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }
}
