use crate::error::EventsError;
use chrono::{DateTime, Utc};
use core_types::{Order, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Published after an order has moved from one status to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub order_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    pub total_amount: Decimal,
    pub items_count: u64,
    pub changed_at: DateTime<Utc>,
}

impl OrderStatusChanged {
    /// Builds the event from the order snapshot taken after the transition.
    pub fn from_order(order: &Order, previous_status: OrderStatus, changed_at: DateTime<Utc>) -> Self {
        Self {
            order_id: order.order_id,
            customer_id: order.customer_id,
            previous_status,
            new_status: order.status,
            total_amount: order.total_amount,
            items_count: order.items_count(),
            changed_at,
        }
    }
}

/// The top-level WebSocket message enum.
///
/// Serialized as `{ "type": "...", "payload": { ... } }` so that clients can
/// switch on `type` without knowing every payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsMessage {
    /// An order moved to a new status.
    OrderStatusChanged(OrderStatusChanged),
    /// Sent once to confirm to a new client that its connection is active.
    Connected,
}

impl WsMessage {
    pub fn to_json(&self) -> Result<String, EventsError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::OrderLine;
    use rust_decimal::Decimal;

    #[test]
    fn test_event_is_tagged_with_type_and_payload() {
        let mut order = Order::new(
            None,
            Utc::now(),
            vec![OrderLine::new(None, 2, Decimal::new(350, 2)).unwrap()],
        );
        order.status = OrderStatus::InPreparation;
        let event = OrderStatusChanged::from_order(&order, OrderStatus::Pending, Utc::now());

        let json: serde_json::Value =
            serde_json::from_str(&WsMessage::OrderStatusChanged(event).to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "OrderStatusChanged");
        assert_eq!(json["payload"]["previous_status"], "Pending");
        assert_eq!(json["payload"]["new_status"], "InPreparation");
        assert_eq!(json["payload"]["items_count"], 2);
    }

    #[test]
    fn test_connected_message() {
        let json = WsMessage::Connected.to_json().unwrap();
        assert_eq!(json, r#"{"type":"Connected"}"#);
    }
}
