use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Filesystem-backed JSON document store. Question-set content lives here;
/// the item store only keeps a `blob_key` pointer to it.
#[derive(Debug)]
pub struct BlobStore {
    root: PathBuf,
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("blob not found: {key}")]
    NotFound { key: String },
    #[error("invalid blob key: {key}")]
    InvalidKey { key: String },
}

impl BlobStore {
    pub fn open(root: &str) -> Result<Self, BlobError> {
        let root = PathBuf::from(root);
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        // Keys are relative slash-separated paths; reject traversal segments.
        if key.is_empty()
            || Path::new(key)
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(BlobError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(key))
    }

    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec(value)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<T, BlobError> {
        let path = self.resolve(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

pub fn question_set_blob_key(question_set_id: &str) -> String {
    format!("question_sets/{}.json", question_set_id)
}
