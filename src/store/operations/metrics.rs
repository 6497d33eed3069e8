use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// Derived per-day aggregate for one `(organization, date)` pair.
/// `paying_user_ids` exists strictly for same-day payer dedup; the invariant
/// `paying_users == |paying_user_ids|` holds at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetric {
    pub organization_id: String,
    pub date: String,
    pub currency: String,
    pub revenue: i64,
    pub order_count: u64,
    pub paying_users: u64,
    #[serde(default)]
    pub paying_user_ids: BTreeSet<String>,
    pub updated_at: i64,
}

impl Store {
    pub fn get_daily_metric(
        &self,
        organization_id: &str,
        date: &str,
    ) -> Result<Option<DailyMetric>, StoreError> {
        let key = keys::metrics_daily_key(organization_id, date);
        match self.metrics_daily.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put_daily_metric(&self, metric: &DailyMetric) -> Result<(), StoreError> {
        let key = keys::metrics_daily_key(&metric.organization_id, &metric.date);
        self.metrics_daily
            .insert(key.as_bytes(), Self::serialize(metric)?)?;
        Ok(())
    }

    /// Day rows in the inclusive date range, ascending by date. The key
    /// layout (`org:YYYY-MM-DD`) makes the range scan come back sorted.
    pub fn list_daily_metrics(
        &self,
        organization_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<DailyMetric>, StoreError> {
        let (start_key, end_key) = keys::metrics_daily_range(organization_id, start_date, end_date);
        let mut metrics = Vec::new();
        for item in self
            .metrics_daily
            .range(start_key.as_bytes()..=end_key.as_bytes())
        {
            let (_, v) = item?;
            metrics.push(Self::deserialize::<DailyMetric>(&v)?);
        }
        Ok(metrics)
    }

    /// Delete every day row in the inclusive range. Only the range rebuild
    /// uses this; there is no single-day delete or decrement operation.
    pub fn delete_daily_metrics_range(
        &self,
        organization_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<usize, StoreError> {
        let (start_key, end_key) = keys::metrics_daily_range(organization_id, start_date, end_date);
        let mut doomed = Vec::new();
        for item in self
            .metrics_daily
            .range(start_key.as_bytes()..=end_key.as_bytes())
        {
            let (k, _) = item?;
            doomed.push(k);
        }
        for key in &doomed {
            self.metrics_daily.remove(key)?;
        }
        Ok(doomed.len())
    }
}
