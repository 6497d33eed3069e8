use crate::constants::WRONG_COUNT_PAD_WIDTH;

pub fn question_set_key(question_set_id: &str) -> String {
    question_set_id.to_string()
}

pub fn collection_key(collection_id: &str) -> String {
    collection_id.to_string()
}

// Stats keys use '|' as separator because bucket names contain ':'
// (e.g. "WEEK:2025-W12") and question ids contain '#'.
pub fn question_stat_key(bucket: &str, question_id: &str) -> String {
    format!("{}|{}", bucket, question_id)
}

pub fn question_stat_prefix(bucket: &str) -> String {
    format!("{}|", bucket)
}

/// Fixed-width zero-padded mirror of the wrong counter. Lexicographic order
/// on the mirror equals numeric order on the counter, which is what the
/// count index relies on.
pub fn wrong_count_mirror(wrong_count: u64) -> String {
    format!("{:0width$}", wrong_count, width = WRONG_COUNT_PAD_WIDTH)
}

pub fn question_stat_count_key(bucket: &str, wrong_count: u64, question_id: &str) -> String {
    format!(
        "{}|{}|{}",
        bucket,
        wrong_count_mirror(wrong_count),
        question_id
    )
}

pub fn metrics_daily_key(organization_id: &str, date: &str) -> String {
    format!("{}:{}", organization_id, date)
}

/// Inclusive key bounds for a date range within one organization partition.
/// Dates are ISO `YYYY-MM-DD`, so the string range is the date range.
pub fn metrics_daily_range(organization_id: &str, start_date: &str, end_date: &str) -> (String, String) {
    (
        metrics_daily_key(organization_id, start_date),
        metrics_daily_key(organization_id, end_date),
    )
}

pub fn order_key(order_id: &str) -> String {
    order_id.to_string()
}

pub fn order_status_key(status: &str, created_at_secs: i64, order_id: &str) -> String {
    let ts = created_at_secs.max(0) as u64;
    format!("{}:{:020}:{}", status, ts, order_id)
}

/// Inclusive key bounds for orders of one status within an epoch range.
/// The `~` upper sentinel sorts after any order id suffix.
pub fn order_status_range(status: &str, start_secs: i64, end_secs: i64) -> (String, String) {
    let start = start_secs.max(0) as u64;
    let end = end_secs.max(0) as u64;
    (
        format!("{}:{:020}:", status, start),
        format!("{}:{:020}:~", status, end),
    )
}

pub fn order_status_prefix(status: &str) -> String {
    format!("{}:", status)
}
