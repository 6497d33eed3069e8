/// Hard server-side cap on top-wrong-questions results, regardless of the
/// caller-requested limit.
pub const TOP_WRONG_HARD_LIMIT: usize = 10;

/// Width of the zero-padded wrong-count mirror in the count index key.
pub const WRONG_COUNT_PAD_WIDTH: usize = 12;

/// Organization partition used by single-tenant deployments.
pub const DEFAULT_ORGANIZATION: &str = "default";

/// Currency recorded on daily metric rows.
pub const DEFAULT_CURRENCY: &str = "VND";

/// Order lifecycle states recognized by the rollup.
pub const ORDER_STATUS_PENDING: &str = "pending";
pub const ORDER_STATUS_COMPLETED: &str = "completed";

pub const PAYMENT_STATUS_PAID: &str = "paid";
pub const PAYMENT_STATUS_UNPAID: &str = "unpaid";

/// Maximum question indices accepted in one wrong-answer batch.
pub const MAX_WRONG_ANSWER_BATCH: usize = 200;
