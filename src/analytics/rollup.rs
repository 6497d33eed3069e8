use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::Serialize;

use crate::constants::{ORDER_STATUS_COMPLETED, ORDER_STATUS_PENDING, PAYMENT_STATUS_PAID};
use crate::store::operations::metrics::DailyMetric;
use crate::store::operations::orders::Order;
use crate::store::{Store, StoreError};

pub fn utc_date_from_epoch(epoch_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH)
        .format("%Y-%m-%d")
        .to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| StoreError::Validation(format!("invalid date: {raw}")))
}

/// Inclusive epoch-second bounds covering `[start_date, end_date]` in UTC.
fn epoch_bounds(start_date: NaiveDate, end_date: NaiveDate) -> (i64, i64) {
    let start = start_date.and_hms_opt(0, 0, 0).expect("midnight").and_utc();
    let end = (end_date + Days::new(1))
        .and_hms_opt(0, 0, 0)
        .expect("midnight")
        .and_utc();
    (start.timestamp(), end.timestamp() - 1)
}

/// First and last day (inclusive, `YYYY-MM-DD`) of the month containing `day`.
fn month_bounds(day: NaiveDate) -> (String, String) {
    let start = day.with_day0(0).expect("first of month");
    let end = start + Months::new(1) - Days::new(1);
    (
        start.format("%Y-%m-%d").to_string(),
        end.format("%Y-%m-%d").to_string(),
    )
}

fn current_and_previous_month(now: DateTime<Utc>) -> ((String, String), (String, String)) {
    let today = now.date_naive();
    let current = month_bounds(today);
    let first_of_current = today.with_day0(0).expect("first of month");
    let previous = month_bounds(first_of_current - Days::new(1));
    (current, previous)
}

/// Month-over-month percentage delta with the documented zero-baseline
/// convention: no prior data counts as 100% growth when the current value is
/// positive and 0% otherwise. Preserved for compatibility, not rigor.
pub fn delta_pct(current: i64, previous: i64) -> f64 {
    if previous > 0 {
        (current - previous) as f64 / previous as f64 * 100.0
    } else if current > 0 {
        100.0
    } else {
        0.0
    }
}

/// Pure merge of one paid order into its day row. Revenue and order count
/// grow unconditionally; the payer counts once per day via the id set.
pub fn apply_order_to_day(
    existing: Option<DailyMetric>,
    organization_id: &str,
    currency: &str,
    date: &str,
    user_id: &str,
    amount: i64,
    now: i64,
) -> DailyMetric {
    match existing {
        Some(mut metric) => {
            metric.revenue += amount;
            metric.order_count += 1;
            if metric.paying_user_ids.insert(user_id.to_string()) {
                metric.paying_users += 1;
            }
            metric.updated_at = now;
            metric
        }
        None => DailyMetric {
            organization_id: organization_id.to_string(),
            date: date.to_string(),
            currency: currency.to_string(),
            revenue: amount,
            order_count: 1,
            paying_users: 1,
            paying_user_ids: BTreeSet::from([user_id.to_string()]),
            updated_at: now,
        },
    }
}

/// Fold a paid order into the daily metrics. Best-effort: metrics are
/// secondary to the order flow, so failures are reported as a structured
/// warning and never propagated to the caller.
pub fn increment_daily_metrics_for_order(
    store: &Store,
    organization_id: &str,
    currency: &str,
    order: &Order,
    now: DateTime<Utc>,
) {
    if order.user_id.is_empty() {
        tracing::debug!(order_id = %order.id, "Order without user id skipped by metrics rollup");
        return;
    }
    let date = utc_date_from_epoch(order.created_at);

    let result: Result<(), StoreError> = (|| {
        let existing = store.get_daily_metric(organization_id, &date)?;
        let next = apply_order_to_day(
            existing,
            organization_id,
            currency,
            &date,
            &order.user_id,
            order.amount(),
            now.timestamp(),
        );
        store.put_daily_metric(&next)
    })();

    if let Err(error) = result {
        tracing::warn!(
            organization_id,
            date = %date,
            order_id = %order.id,
            error = %error,
            "Daily metrics increment failed; order flow continues"
        );
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub date: String,
    pub revenue: i64,
    pub order_count: u64,
    pub paying_users: u64,
}

/// Day rows in the inclusive range, ascending by date. `payingUsers` falls
/// back to the id-set cardinality for legacy rows without the stored count.
pub fn metrics_series(
    store: &Store,
    organization_id: &str,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<SeriesPoint>, StoreError> {
    parse_date(start_date)?;
    parse_date(end_date)?;
    let rows = store.list_daily_metrics(organization_id, start_date, end_date)?;
    Ok(rows
        .into_iter()
        .map(|m| {
            let paying_users = if m.paying_users == 0 {
                m.paying_user_ids.len() as u64
            } else {
                m.paying_users
            };
            SeriesPoint {
                date: m.date,
                revenue: m.revenue,
                order_count: m.order_count,
                paying_users,
            }
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueMonthCompare {
    pub current_month_revenue: i64,
    pub previous_month_revenue: i64,
    pub delta: i64,
    pub delta_pct: f64,
    pub current_month: String,
    pub previous_month: String,
}

pub fn revenue_month_compare(
    store: &Store,
    organization_id: &str,
    now: DateTime<Utc>,
) -> Result<RevenueMonthCompare, StoreError> {
    let ((cur_start, cur_end), (prev_start, prev_end)) = current_and_previous_month(now);

    let sum_range = |start: &str, end: &str| -> Result<i64, StoreError> {
        Ok(store
            .list_daily_metrics(organization_id, start, end)?
            .iter()
            .map(|m| m.revenue)
            .sum())
    };

    let current = sum_range(&cur_start, &cur_end)?;
    let previous = sum_range(&prev_start, &prev_end)?;

    Ok(RevenueMonthCompare {
        current_month_revenue: current,
        previous_month_revenue: previous,
        delta: current - previous,
        delta_pct: delta_pct(current, previous),
        current_month: cur_start[..7].to_string(),
        previous_month: prev_start[..7].to_string(),
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayingUsersMonth {
    pub month: String,
    pub paying_users_month: u64,
}

fn unique_payers_in_range(
    store: &Store,
    organization_id: &str,
    start: &str,
    end: &str,
) -> Result<u64, StoreError> {
    let mut users: BTreeSet<String> = BTreeSet::new();
    for metric in store.list_daily_metrics(organization_id, start, end)? {
        users.extend(metric.paying_user_ids);
    }
    Ok(users.len() as u64)
}

/// Distinct paying users across the current UTC month. Users appearing on
/// several days count once: the per-day id sets are unioned, not summed.
pub fn paying_users_month_unique(
    store: &Store,
    organization_id: &str,
    now: DateTime<Utc>,
) -> Result<PayingUsersMonth, StoreError> {
    let ((cur_start, cur_end), _) = current_and_previous_month(now);
    let count = unique_payers_in_range(store, organization_id, &cur_start, &cur_end)?;
    Ok(PayingUsersMonth {
        month: cur_start[..7].to_string(),
        paying_users_month: count,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayingUsersMonthCompare {
    pub current_month_users: u64,
    pub previous_month_users: u64,
    pub delta: i64,
    pub delta_pct: f64,
    pub current_month: String,
    pub previous_month: String,
}

pub fn paying_users_month_compare(
    store: &Store,
    organization_id: &str,
    now: DateTime<Utc>,
) -> Result<PayingUsersMonthCompare, StoreError> {
    let ((cur_start, cur_end), (prev_start, prev_end)) = current_and_previous_month(now);
    let current = unique_payers_in_range(store, organization_id, &cur_start, &cur_end)?;
    let previous = unique_payers_in_range(store, organization_id, &prev_start, &prev_end)?;

    Ok(PayingUsersMonthCompare {
        current_month_users: current,
        previous_month_users: previous,
        delta: current as i64 - previous as i64,
        delta_pct: delta_pct(current as i64, previous as i64),
        current_month: cur_start[..7].to_string(),
        previous_month: prev_start[..7].to_string(),
    })
}

#[derive(Debug, Default)]
struct DayAgg {
    revenue: i64,
    order_count: u64,
    users: BTreeSet<String>,
}

fn aggregate_orders_by_day(orders: &[Order]) -> BTreeMap<String, DayAgg> {
    let mut by_day: BTreeMap<String, DayAgg> = BTreeMap::new();
    for order in orders {
        let day = utc_date_from_epoch(order.created_at);
        let agg = by_day.entry(day).or_default();
        agg.revenue += order.amount();
        agg.order_count += 1;
        if !order.user_id.is_empty() {
            agg.users.insert(order.user_id.clone());
        }
    }
    by_day
}

fn revenue_orders_in_range(
    store: &Store,
    start_secs: i64,
    end_secs: i64,
    include_pending_paid: bool,
) -> Result<Vec<Order>, StoreError> {
    let mut orders =
        store.list_orders_by_status_in_range(ORDER_STATUS_COMPLETED, start_secs, end_secs)?;
    if include_pending_paid {
        let pending =
            store.list_orders_by_status_in_range(ORDER_STATUS_PENDING, start_secs, end_secs)?;
        orders.extend(
            pending
                .into_iter()
                .filter(|o| o.payment_status == PAYMENT_STATUS_PAID),
        );
    }
    Ok(orders)
}

/// Series computed directly from the order log, bypassing the derived day
/// rows. Optionally counts pending orders that are already paid.
pub fn order_metrics_series(
    store: &Store,
    start_date: &str,
    end_date: &str,
    include_pending_paid: bool,
) -> Result<Vec<SeriesPoint>, StoreError> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    let (start_secs, end_secs) = epoch_bounds(start, end);

    let orders = revenue_orders_in_range(store, start_secs, end_secs, include_pending_paid)?;
    Ok(aggregate_orders_by_day(&orders)
        .into_iter()
        .map(|(date, agg)| SeriesPoint {
            date,
            revenue: agg.revenue,
            order_count: agg.order_count,
            paying_users: agg.users.len() as u64,
        })
        .collect())
}

/// Rebuild the day rows for `[start_date, end_date]` from completed orders.
///
/// The only reconciliation path: existing rows in the range are deleted and
/// replaced by a fresh aggregation, so drift from missed increments or
/// refunds is wiped rather than patched. Holds no cross-row transaction; a
/// crash mid-rebuild leaves the range partially reconciled until re-run.
pub fn rebuild_metrics_range(
    store: &Store,
    organization_id: &str,
    currency: &str,
    start_date: &str,
    end_date: &str,
    now: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    if start > end {
        return Err(StoreError::Validation(format!(
            "startDate {start_date} is after endDate {end_date}"
        )));
    }
    let (start_secs, end_secs) = epoch_bounds(start, end);

    let orders =
        store.list_orders_by_status_in_range(ORDER_STATUS_COMPLETED, start_secs, end_secs)?;
    let by_day = aggregate_orders_by_day(&orders);

    store.delete_daily_metrics_range(organization_id, start_date, end_date)?;

    let now_secs = now.timestamp();
    for (date, agg) in &by_day {
        store.put_daily_metric(&DailyMetric {
            organization_id: organization_id.to_string(),
            date: date.clone(),
            currency: currency.to_string(),
            revenue: agg.revenue,
            order_count: agg.order_count,
            paying_users: agg.users.len() as u64,
            paying_user_ids: agg.users.clone(),
            updated_at: now_secs,
        })?;
    }
    Ok(by_day.len())
}
