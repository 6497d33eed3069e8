use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// One logical row per `(bucket, question_id)`: the failure counter plus
/// write-once snapshot fields captured at first-failure time. Snapshots are
/// deliberately decoupled from the live question set content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStat {
    pub bucket: String,
    pub question_id: String,
    pub question_set_id: String,
    pub question_index: usize,
    pub title: String,
    pub collection_id: String,
    pub collection_name: String,
    pub html: String,
    pub correct_answer: String,
    pub explanation: String,
    pub selector: String,
    pub wrong_count: u64,
    pub updated_at: i64,
}

impl Store {
    pub fn get_question_stat(
        &self,
        bucket: &str,
        question_id: &str,
    ) -> Result<Option<QuestionStat>, StoreError> {
        let key = keys::question_stat_key(bucket, question_id);
        match self.question_stats.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write a stat row and keep the count index in step. The index entry is
    /// recomputed from the authoritative numeric counter on every write;
    /// `previous_count` is the counter value the row held before this write
    /// (if any), whose index entry must be retired.
    pub fn put_question_stat(
        &self,
        stat: &QuestionStat,
        previous_count: Option<u64>,
    ) -> Result<(), StoreError> {
        let key = keys::question_stat_key(&stat.bucket, &stat.question_id);
        self.question_stats
            .insert(key.as_bytes(), Self::serialize(stat)?)?;

        if let Some(old_count) = previous_count {
            if old_count != stat.wrong_count {
                let old_index_key =
                    keys::question_stat_count_key(&stat.bucket, old_count, &stat.question_id);
                self.question_stats_by_count
                    .remove(old_index_key.as_bytes())?;
            }
        }
        let index_key =
            keys::question_stat_count_key(&stat.bucket, stat.wrong_count, &stat.question_id);
        self.question_stats_by_count
            .insert(index_key.as_bytes(), stat.question_id.as_bytes())?;
        Ok(())
    }

    /// Top stats for a bucket via the count index. The index sorts ascending
    /// on the padded count mirror, so a reverse scan yields counts descending.
    pub fn top_question_stats(
        &self,
        bucket: &str,
        limit: usize,
    ) -> Result<Vec<QuestionStat>, StoreError> {
        let prefix = keys::question_stat_prefix(bucket);
        let mut stats = Vec::new();
        for item in self
            .question_stats_by_count
            .scan_prefix(prefix.as_bytes())
            .rev()
        {
            let (_, question_id_raw) = item?;
            let question_id = String::from_utf8_lossy(&question_id_raw).to_string();
            // Stale index entries (row missing) are skipped, not errors
            if let Some(stat) = self.get_question_stat(bucket, &question_id)? {
                stats.push(stat);
                if stats.len() >= limit {
                    break;
                }
            }
        }
        Ok(stats)
    }

    /// Fallback path: full bucket scan on the primary tree, sorted in memory
    /// by counter descending. Used when the count index has no rows yet.
    pub fn scan_question_stats_by_count(
        &self,
        bucket: &str,
        limit: usize,
    ) -> Result<Vec<QuestionStat>, StoreError> {
        let prefix = keys::question_stat_prefix(bucket);
        let mut stats = Vec::new();
        for item in self.question_stats.scan_prefix(prefix.as_bytes()) {
            let (_, v) = item?;
            stats.push(Self::deserialize::<QuestionStat>(&v)?);
        }
        stats.sort_by(|a, b| b.wrong_count.cmp(&a.wrong_count));
        stats.truncate(limit);
        Ok(stats)
    }
}
