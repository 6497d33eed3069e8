use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub question_sets: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn upsert_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        let key = keys::collection_key(&collection.uid);
        self.collections
            .insert(key.as_bytes(), Self::serialize(collection)?)?;
        Ok(())
    }

    pub fn get_collection(&self, collection_id: &str) -> Result<Option<Collection>, StoreError> {
        let key = keys::collection_key(collection_id);
        match self.collections.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Reverse lookup: the collection that contains a given question set.
    /// Full scan, acceptable for the small collection count this serves.
    pub fn find_collection_with_question_set(
        &self,
        question_set_id: &str,
    ) -> Result<Option<Collection>, StoreError> {
        for item in self.collections.iter() {
            let (_, v) = item?;
            let collection: Collection = Self::deserialize(&v)?;
            if collection
                .question_sets
                .iter()
                .any(|uid| uid == question_set_id)
            {
                return Ok(Some(collection));
            }
        }
        Ok(None)
    }

    pub fn attach_question_set_to_collection(
        &self,
        collection_id: &str,
        question_set_id: &str,
    ) -> Result<(), StoreError> {
        let key = keys::collection_key(collection_id);
        if let Some(raw) = self.collections.get(key.as_bytes())? {
            let mut collection: Collection = Self::deserialize(&raw)?;
            if !collection
                .question_sets
                .iter()
                .any(|uid| uid == question_set_id)
            {
                collection.question_sets.push(question_set_id.to_string());
                self.collections
                    .insert(key.as_bytes(), Self::serialize(&collection)?)?;
            }
        }
        Ok(())
    }
}
