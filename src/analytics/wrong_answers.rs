use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analytics::window::{active_buckets, StatsWindow};
use crate::blob::{question_set_blob_key, BlobError, BlobStore};
use crate::constants::TOP_WRONG_HARD_LIMIT;
use crate::store::operations::question_stats::QuestionStat;
use crate::store::{Store, StoreError};

/// Question-set content as stored in the blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSetContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionContent {
    #[serde(default)]
    pub html_content: String,
    #[serde(default)]
    pub answer_mapping: Vec<AnswerMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerMapping {
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub correct_value: serde_json::Value,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("question set not found: {0}")]
    QuestionSetNotFound(String),
    #[error("question set content missing: {0}")]
    ContentMissing(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Point-in-time capture of one question, taken when its first wrong-answer
/// event arrives. Later content edits never touch already-written snapshots.
#[derive(Debug, Clone)]
pub struct WrongAnswerSnapshot {
    pub question_set_id: String,
    pub question_index: usize,
    pub title: String,
    pub collection_id: String,
    pub collection_name: String,
    pub html: String,
    pub correct_answer: String,
    pub explanation: String,
    pub selector: String,
}

impl WrongAnswerSnapshot {
    pub fn question_id(&self) -> String {
        format!("{}#{}", self.question_set_id, self.question_index)
    }
}

/// Outcome of one wrong-answer batch. Partial success is expected: a failed
/// bucket write lands in `errors` without aborting the rest of the batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub updated: usize,
    pub updated_ids: Vec<String>,
    pub errors: Vec<String>,
}

impl RecordOutcome {
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Pure merge of one wrong-answer event into a bucket row. Snapshot fields
/// are first-writer-wins; only the counter and timestamp move on repeats.
pub fn apply_wrong_answer(
    bucket: &str,
    existing: Option<QuestionStat>,
    snapshot: &WrongAnswerSnapshot,
    now: i64,
) -> QuestionStat {
    match existing {
        Some(mut stat) => {
            stat.wrong_count += 1;
            stat.updated_at = now;
            stat
        }
        None => QuestionStat {
            bucket: bucket.to_string(),
            question_id: snapshot.question_id(),
            question_set_id: snapshot.question_set_id.clone(),
            question_index: snapshot.question_index,
            title: snapshot.title.clone(),
            collection_id: snapshot.collection_id.clone(),
            collection_name: snapshot.collection_name.clone(),
            html: snapshot.html.clone(),
            correct_answer: snapshot.correct_answer.clone(),
            explanation: snapshot.explanation.clone(),
            selector: snapshot.selector.clone(),
            wrong_count: 1,
            updated_at: now,
        },
    }
}

/// Normalize a correct-answer value for snapshot storage: scalars as plain
/// text, composites as JSON.
pub fn normalize_correct_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

/// Accepts either a bare index (`"3"`) or a composite id (`"qs1#3"`) and
/// extracts the index part.
pub fn extract_question_index(raw: &str) -> Option<usize> {
    raw.rsplit('#').next()?.trim().parse::<usize>().ok()
}

/// Best-effort collection-name resolution: explicit id lookup first, then a
/// reverse scan for a collection containing the question set. Failures leave
/// the name blank; they never fail the batch.
fn resolve_collection_name(
    store: &Store,
    collection_id: Option<&str>,
    question_set_id: &str,
) -> String {
    if let Some(cid) = collection_id {
        match store.get_collection(cid) {
            Ok(Some(collection)) => return collection.name,
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(collection_id = cid, error = %error, "Collection lookup failed");
            }
        }
    }
    match store.find_collection_with_question_set(question_set_id) {
        Ok(Some(collection)) => collection.name,
        Ok(None) => String::new(),
        Err(error) => {
            tracing::warn!(question_set_id, error = %error, "Collection reverse lookup failed");
            String::new()
        }
    }
}

/// Record a batch of wrong-answer events against a question set.
///
/// Each eligible index fans out into the three buckets active right now
/// (ALL, current ISO week, current month). Only questions with exactly one
/// answer-mapping entry are tracked; multi-part questions are skipped since
/// the failing sub-answer cannot be attributed.
pub fn record_wrong_answers(
    store: &Store,
    blobs: &BlobStore,
    user_id: &str,
    question_set_id: &str,
    question_ids: &[String],
    collection_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<RecordOutcome, TrackError> {
    let meta = store
        .get_question_set(question_set_id)?
        .ok_or_else(|| TrackError::QuestionSetNotFound(question_set_id.to_string()))?;

    let content: QuestionSetContent = match blobs.get_json(&meta.blob_key) {
        Ok(content) => content,
        Err(BlobError::NotFound { .. }) => {
            return Err(TrackError::ContentMissing(question_set_id.to_string()))
        }
        Err(error) => {
            tracing::error!(question_set_id, error = %error, "Failed to load question set content");
            return Err(TrackError::ContentMissing(question_set_id.to_string()));
        }
    };

    let collection_name = resolve_collection_name(store, collection_id, question_set_id);

    let buckets = active_buckets(now);
    let now_secs = now.timestamp();

    let mut updated = 0usize;
    let mut updated_ids: Vec<String> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for raw in question_ids {
        let Some(index) = extract_question_index(raw) else {
            continue;
        };
        let Some(question) = content.questions.get(index) else {
            continue;
        };
        // Only track single-mapping questions
        if question.answer_mapping.len() != 1 {
            continue;
        }
        let mapping = &question.answer_mapping[0];

        let snapshot = WrongAnswerSnapshot {
            question_set_id: question_set_id.to_string(),
            question_index: index,
            title: content.title.clone(),
            collection_id: collection_id.unwrap_or("").to_string(),
            collection_name: collection_name.clone(),
            html: question.html_content.clone(),
            correct_answer: normalize_correct_value(&mapping.correct_value),
            explanation: mapping.explanation.clone(),
            selector: mapping.selector.clone(),
        };
        let question_id = snapshot.question_id();

        let mut success_any = false;
        for bucket in &buckets {
            match upsert_bucket(store, bucket, &snapshot, now_secs) {
                Ok(()) => success_any = true,
                Err(error) => {
                    tracing::warn!(
                        user_id,
                        bucket = bucket.as_str(),
                        question_id = question_id.as_str(),
                        error = %error,
                        "Wrong-answer bucket write failed"
                    );
                    errors.push(format!("{}/{}: {}", bucket, question_id, error));
                }
            }
        }
        if success_any {
            updated += 1;
            updated_ids.push(question_id);
        }
    }

    Ok(RecordOutcome {
        updated,
        updated_ids,
        errors,
    })
}

fn upsert_bucket(
    store: &Store,
    bucket: &str,
    snapshot: &WrongAnswerSnapshot,
    now_secs: i64,
) -> Result<(), StoreError> {
    let question_id = snapshot.question_id();
    let existing = store.get_question_stat(bucket, &question_id)?;
    let previous_count = existing.as_ref().map(|s| s.wrong_count);
    let next = apply_wrong_answer(bucket, existing, snapshot, now_secs);
    store.put_question_stat(&next, previous_count)
}

/// Top most-missed questions for the current bucket of `period`. The result
/// is hard-capped at 10 rows regardless of the caller-requested limit; an
/// empty dataset yields an empty list, never an error.
pub fn get_top_wrong_questions(
    store: &Store,
    period: StatsWindow,
    now: DateTime<Utc>,
) -> Result<(String, Vec<QuestionStat>), StoreError> {
    let bucket = period.bucket_key(now);
    let stats = store.top_question_stats(&bucket, TOP_WRONG_HARD_LIMIT)?;
    if !stats.is_empty() {
        return Ok((bucket, stats));
    }
    // Count index not populated yet: scan the bucket partition instead
    let stats = store.scan_question_stats_by_count(&bucket, TOP_WRONG_HARD_LIMIT)?;
    Ok((bucket, stats))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::tempdir;

    use crate::store::operations::question_sets::QuestionSetMeta;

    use super::*;

    fn snapshot(question_set_id: &str, index: usize) -> WrongAnswerSnapshot {
        WrongAnswerSnapshot {
            question_set_id: question_set_id.to_string(),
            question_index: index,
            title: "Set 1".to_string(),
            collection_id: String::new(),
            collection_name: String::new(),
            html: "<p>original</p>".to_string(),
            correct_answer: "B".to_string(),
            explanation: "because".to_string(),
            selector: "#q0".to_string(),
        }
    }

    #[test]
    fn apply_keeps_first_snapshot_and_bumps_counter() {
        let first = apply_wrong_answer("ALL", None, &snapshot("qs1", 0), 100);
        assert_eq!(first.wrong_count, 1);
        assert_eq!(first.html, "<p>original</p>");

        // Repeat with different content: snapshot must not move
        let mut changed = snapshot("qs1", 0);
        changed.html = "<p>edited</p>".to_string();
        changed.correct_answer = "C".to_string();
        let second = apply_wrong_answer("ALL", Some(first), &changed, 200);
        assert_eq!(second.wrong_count, 2);
        assert_eq!(second.html, "<p>original</p>");
        assert_eq!(second.correct_answer, "B");
        assert_eq!(second.updated_at, 200);
    }

    #[test]
    fn normalizes_scalar_and_composite_values() {
        assert_eq!(normalize_correct_value(&serde_json::json!("B")), "B");
        assert_eq!(normalize_correct_value(&serde_json::json!(42)), "42");
        assert_eq!(normalize_correct_value(&serde_json::json!(true)), "true");
        assert_eq!(normalize_correct_value(&serde_json::Value::Null), "");
        assert_eq!(
            normalize_correct_value(&serde_json::json!(["A", "C"])),
            r#"["A","C"]"#
        );
    }

    #[test]
    fn extracts_bare_and_composite_indices() {
        assert_eq!(extract_question_index("3"), Some(3));
        assert_eq!(extract_question_index("qs1#7"), Some(7));
        assert_eq!(extract_question_index("qs1#x"), None);
        assert_eq!(extract_question_index(""), None);
    }

    fn seed_question_set(store: &Store, blobs: &BlobStore, uid: &str) {
        let content = QuestionSetContent {
            title: "Set 1".to_string(),
            questions: vec![
                QuestionContent {
                    html_content: "<p>q0</p>".to_string(),
                    answer_mapping: vec![AnswerMapping {
                        selector: "#q0".to_string(),
                        correct_value: serde_json::json!("B"),
                        explanation: "because".to_string(),
                    }],
                },
                QuestionContent {
                    html_content: "<p>q1 multi</p>".to_string(),
                    answer_mapping: vec![
                        AnswerMapping {
                            selector: "#q1a".to_string(),
                            correct_value: serde_json::json!("A"),
                            explanation: String::new(),
                        },
                        AnswerMapping {
                            selector: "#q1b".to_string(),
                            correct_value: serde_json::json!("C"),
                            explanation: String::new(),
                        },
                    ],
                },
                QuestionContent {
                    html_content: "<p>q2 unmapped</p>".to_string(),
                    answer_mapping: vec![],
                },
            ],
        };
        let blob_key = question_set_blob_key(uid);
        blobs.put_json(&blob_key, &content).unwrap();
        store
            .upsert_question_set(&QuestionSetMeta {
                uid: uid.to_string(),
                title: content.title.clone(),
                blob_key,
                question_count: content.questions.len() as u64,
                created_at: Utc::now(),
            })
            .unwrap();
    }

    #[test]
    fn event_fans_out_into_all_three_buckets() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let blobs = BlobStore::open(dir.path().join("blobs").to_str().unwrap()).unwrap();
        seed_question_set(&store, &blobs, "qs1");

        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let outcome = record_wrong_answers(
            &store,
            &blobs,
            "u1",
            "qs1",
            &["0".to_string()],
            None,
            now,
        )
        .unwrap();
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.updated_ids, vec!["qs1#0".to_string()]);
        assert!(outcome.errors.is_empty());

        for bucket in ["ALL", "WEEK:2025-W11", "MONTH:2025-03"] {
            let stat = store.get_question_stat(bucket, "qs1#0").unwrap().unwrap();
            assert_eq!(stat.wrong_count, 1, "bucket {bucket}");
        }
    }

    #[test]
    fn multi_part_and_unmapped_questions_are_skipped() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let blobs = BlobStore::open(dir.path().join("blobs").to_str().unwrap()).unwrap();
        seed_question_set(&store, &blobs, "qs1");

        let outcome = record_wrong_answers(
            &store,
            &blobs,
            "u1",
            "qs1",
            &["1".to_string(), "2".to_string(), "9".to_string()],
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(outcome.updated, 0);
        assert!(store.get_question_stat("ALL", "qs1#1").unwrap().is_none());
        assert!(store.get_question_stat("ALL", "qs1#2").unwrap().is_none());
    }

    #[test]
    fn missing_question_set_fails_the_whole_batch() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let blobs = BlobStore::open(dir.path().join("blobs").to_str().unwrap()).unwrap();

        let err = record_wrong_answers(
            &store,
            &blobs,
            "u1",
            "missing",
            &["0".to_string()],
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, TrackError::QuestionSetNotFound(_)));
    }

    #[test]
    fn repeated_events_in_one_week_rank_to_the_top() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let blobs = BlobStore::open(dir.path().join("blobs").to_str().unwrap()).unwrap();
        seed_question_set(&store, &blobs, "qs1");

        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        for _ in 0..3 {
            record_wrong_answers(&store, &blobs, "u1", "qs1", &["0".to_string()], None, now)
                .unwrap();
        }

        let (bucket, top) = get_top_wrong_questions(&store, StatsWindow::Week, now).unwrap();
        assert_eq!(bucket, "WEEK:2025-W11");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].question_id, "qs1#0");
        assert_eq!(top[0].wrong_count, 3);
    }

    #[test]
    fn collection_name_is_snapshotted_from_reverse_lookup() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let blobs = BlobStore::open(dir.path().join("blobs").to_str().unwrap()).unwrap();
        seed_question_set(&store, &blobs, "qs1");
        store
            .upsert_collection(&crate::store::operations::collections::Collection {
                uid: "c1".to_string(),
                name: "TOEIC".to_string(),
                question_sets: vec!["qs1".to_string()],
                created_at: Utc::now(),
            })
            .unwrap();

        record_wrong_answers(
            &store,
            &blobs,
            "u1",
            "qs1",
            &["0".to_string()],
            None,
            Utc::now(),
        )
        .unwrap();

        let stat = store.get_question_stat("ALL", "qs1#0").unwrap().unwrap();
        assert_eq!(stat.collection_name, "TOEIC");
    }
}
