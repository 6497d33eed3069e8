use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// Authoritative order row. The rollup only reads these; it never mutates
/// them beyond the pending -> completed transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub payment_status: String,
    #[serde(default)]
    pub final_price: Option<i64>,
    #[serde(default)]
    pub total_price: Option<i64>,
    #[serde(with = "epoch_secs")]
    pub created_at: i64,
}

impl Order {
    /// Revenue amount of an order: `finalPrice`, falling back to `totalPrice`.
    pub fn amount(&self) -> i64 {
        self.final_price.or(self.total_price).unwrap_or(0)
    }
}

/// `createdAt` has historically been persisted both as a JSON number and as
/// a string of digits. All coercion happens here, at the store boundary;
/// everything above works with plain epoch seconds.
pub mod epoch_secs {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        struct EpochVisitor;

        impl Visitor<'_> for EpochVisitor {
            type Value = i64;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("epoch seconds as an integer or a string of digits")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
                i64::try_from(v).map_err(|_| E::custom("epoch seconds out of range"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
                Ok(v as i64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
                v.trim()
                    .parse::<i64>()
                    .map_err(|_| E::custom(format!("invalid epoch seconds string: {v:?}")))
            }
        }

        deserializer.deserialize_any(EpochVisitor)
    }
}

impl Store {
    pub fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        let key = keys::order_key(&order.id);
        self.orders.insert(key.as_bytes(), Self::serialize(order)?)?;
        let index_key = keys::order_status_key(&order.status, order.created_at, &order.id);
        self.orders_by_status
            .insert(index_key.as_bytes(), order.id.as_bytes())?;
        Ok(())
    }

    pub fn get_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        let key = keys::order_key(order_id);
        match self.orders.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Transition an order to a new status, moving its status index entry.
    pub fn set_order_status(
        &self,
        order_id: &str,
        status: &str,
        payment_status: &str,
    ) -> Result<Order, StoreError> {
        let key = keys::order_key(order_id);
        let raw = self
            .orders
            .get(key.as_bytes())?
            .ok_or_else(|| StoreError::NotFound {
                entity: "order".to_string(),
                key: order_id.to_string(),
            })?;
        let mut order: Order = Self::deserialize(&raw)?;

        let old_index_key = keys::order_status_key(&order.status, order.created_at, &order.id);
        self.orders_by_status.remove(old_index_key.as_bytes())?;

        order.status = status.to_string();
        order.payment_status = payment_status.to_string();
        self.orders
            .insert(key.as_bytes(), Self::serialize(&order)?)?;
        let new_index_key = keys::order_status_key(&order.status, order.created_at, &order.id);
        self.orders_by_status
            .insert(new_index_key.as_bytes(), order.id.as_bytes())?;
        Ok(order)
    }

    /// Orders of one status with `created_at` in `[start_secs, end_secs]`.
    ///
    /// Primary path is a range scan over the status index. If the index
    /// yields nothing (unpopulated after historical writes that bypassed it),
    /// fall back to a status-partition scan filtered by timestamp in memory.
    pub fn list_orders_by_status_in_range(
        &self,
        status: &str,
        start_secs: i64,
        end_secs: i64,
    ) -> Result<Vec<Order>, StoreError> {
        let (start_key, end_key) = keys::order_status_range(status, start_secs, end_secs);
        let mut orders = Vec::new();
        for item in self
            .orders_by_status
            .range(start_key.as_bytes()..=end_key.as_bytes())
        {
            let (_, order_id_raw) = item?;
            let order_id = String::from_utf8_lossy(&order_id_raw).to_string();
            if let Some(order) = self.get_order(&order_id)? {
                orders.push(order);
            }
        }

        if orders.is_empty() {
            for item in self.orders.iter() {
                let (_, v) = item?;
                let order: Order = Self::deserialize(&v)?;
                if order.status == status
                    && order.created_at >= start_secs
                    && order.created_at <= end_secs
                {
                    orders.push(order);
                }
            }
            orders.sort_by_key(|o| o.created_at);
        }
        Ok(orders)
    }

    /// Rebuild the status index from the order rows. Idempotent.
    pub fn rebuild_order_status_index(&self) -> Result<(), StoreError> {
        for item in self.orders.iter() {
            let (_, v) = item?;
            let order: Order = Self::deserialize(&v)?;
            let index_key = keys::order_status_key(&order.status, order.created_at, &order.id);
            self.orders_by_status
                .insert(index_key.as_bytes(), order.id.as_bytes())?;
        }
        Ok(())
    }
}
