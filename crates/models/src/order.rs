use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{require_non_empty, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Orders in a terminal state no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Which slice of a user's orders to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Current,
    History,
}

impl OrderScope {
    pub fn suffix(self) -> &'static str {
        match self {
            OrderScope::All => "",
            OrderScope::Current => "/current",
            OrderScope::History => "/history",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderStats {
    pub total: u64,
    pub pending: u64,
    pub active: u64,
    pub delivered: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderDashboard {
    pub stats: OrderStats,
    pub recent_orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub pickup_address: String,
    pub delivery_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl NewOrder {
    pub fn validate(&self) -> Result<(), ModelError> {
        require_non_empty("pickupAddress", &self.pickup_address)?;
        require_non_empty("deliveryAddress", &self.delivery_address)?;
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(ModelError::Validation("price must be a non-negative number".into()));
            }
        }
        Ok(())
    }
}

/// Partial update for `PUT /api/orders/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl OrderUpdate {
    pub fn is_empty(&self) -> bool {
        self.pickup_address.is_none()
            && self.delivery_address.is_none()
            && self.description.is_none()
            && self.price.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_order_deserializes() {
        let o: Order = serde_json::from_value(json!({"id": "o1", "status": "PENDING"})).unwrap();
        assert_eq!(o.status, OrderStatus::Pending);
        assert!(o.driver_id.is_none());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let res = serde_json::from_value::<Order>(json!({"id": "o1", "status": "LOST"}));
        assert!(res.is_err());
    }

    #[test]
    fn new_order_requires_addresses() {
        let order = NewOrder { pickup_address: "".into(), delivery_address: "B".into(), description: None, price: None };
        assert_eq!(order.validate().unwrap_err(), ModelError::required("pickupAddress"));
    }

    #[test]
    fn dashboard_tolerates_missing_sections() {
        let d: OrderDashboard = serde_json::from_value(json!({"stats": {"total": 3}})).unwrap();
        assert_eq!(d.stats.total, 3);
        assert!(d.recent_orders.is_empty());
    }
}
