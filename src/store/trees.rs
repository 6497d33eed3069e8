pub const QUESTION_SETS: &str = "question_sets";
pub const COLLECTIONS: &str = "collections";
pub const QUESTION_STATS: &str = "question_stats";
pub const ORDERS: &str = "orders";
pub const METRICS_DAILY: &str = "metrics_daily";
pub const META: &str = "meta";

// Secondary index trees
pub const QUESTION_STATS_BY_COUNT: &str = "question_stats_by_count";
pub const ORDERS_BY_STATUS: &str = "orders_by_status";
