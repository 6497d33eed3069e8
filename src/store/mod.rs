pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub question_sets: sled::Tree,
    pub collections: sled::Tree,
    pub question_stats: sled::Tree,
    pub orders: sled::Tree,
    pub metrics_daily: sled::Tree,
    pub meta: sled::Tree,
    // Secondary index trees
    pub question_stats_by_count: sled::Tree,
    pub orders_by_status: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let question_sets = db.open_tree(trees::QUESTION_SETS)?;
        let collections = db.open_tree(trees::COLLECTIONS)?;
        let question_stats = db.open_tree(trees::QUESTION_STATS)?;
        let orders = db.open_tree(trees::ORDERS)?;
        let metrics_daily = db.open_tree(trees::METRICS_DAILY)?;
        let meta = db.open_tree(trees::META)?;
        let question_stats_by_count = db.open_tree(trees::QUESTION_STATS_BY_COUNT)?;
        let orders_by_status = db.open_tree(trees::ORDERS_BY_STATUS)?;

        Ok(Self {
            db,
            question_sets,
            collections,
            question_stats,
            orders,
            metrics_daily,
            meta,
            question_stats_by_count,
            orders_by_status,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
