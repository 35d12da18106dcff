use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::iso8601;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    /// Order ids are case-insensitive and tolerate surrounding whitespace.
    pub fn normalized(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Processing,
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::InTransit => "In Transit",
            Self::Delivered => "Delivered",
        }
    }
}

/// One row of the order table.
///
/// `milestone` is the estimated delivery for open orders and the actual
/// delivery time once the order is `Delivered`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub status: OrderStatus,
    pub details: String,
    pub milestone: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TrackingReport {
    Found {
        order_id: String,
        status: &'static str,
        details: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        estimated_delivery: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        delivery_date: Option<String>,
    },
    NotFound {
        error: &'static str,
        order_id: String,
    },
}

impl TrackingReport {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrderBook {
    orders: BTreeMap<OrderId, OrderRecord>,
}

impl OrderBook {
    /// The demo order table, with delivery times anchored on `now`.
    pub fn fixtures(now: DateTime<Utc>) -> Self {
        let mut book = Self::default();
        book.insert(OrderRecord {
            id: OrderId("ORD123456".to_string()),
            status: OrderStatus::Processing,
            details: "Order received and is being prepared for shipment".to_string(),
            milestone: now + Duration::days(5),
        });
        book.insert(OrderRecord {
            id: OrderId("ORD789012".to_string()),
            status: OrderStatus::InTransit,
            details: "Package has left our facility and is en route to the destination"
                .to_string(),
            milestone: now + Duration::days(2),
        });
        book.insert(OrderRecord {
            id: OrderId("ORD345678".to_string()),
            status: OrderStatus::Delivered,
            details: "Package was delivered to the recipient".to_string(),
            milestone: now - Duration::days(1),
        });
        book
    }

    pub fn insert(&mut self, record: OrderRecord) {
        self.orders.insert(record.id.clone(), record);
    }

    pub fn get(&self, raw_id: &str) -> Option<&OrderRecord> {
        self.orders.get(&OrderId::normalized(raw_id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &OrderId> {
        self.orders.keys()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn track(&self, raw_id: &str) -> TrackingReport {
        let Some(record) = self.get(raw_id) else {
            return TrackingReport::NotFound {
                error: "Order not found",
                order_id: raw_id.to_string(),
            };
        };

        let milestone = iso8601(record.milestone);
        let (estimated_delivery, delivery_date) = match record.status {
            OrderStatus::Delivered => (None, Some(milestone)),
            OrderStatus::Processing | OrderStatus::InTransit => (Some(milestone), None),
        };

        TrackingReport::Found {
            order_id: record.id.0.clone(),
            status: record.status.label(),
            details: record.details.clone(),
            estimated_delivery,
            delivery_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::{OrderBook, OrderStatus, TrackingReport};

    fn parse(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).expect("valid timestamp").with_timezone(&Utc)
    }

    #[test]
    fn fixture_orders_report_exactly_one_milestone_field() {
        let now = Utc::now();
        let book = OrderBook::fixtures(now);
        assert_eq!(book.len(), 3);

        for id in ["ORD123456", "ORD789012", "ORD345678"] {
            let record = book.get(id).expect("fixture order");
            let payload = serde_json::to_value(book.track(id)).expect("serializable report");

            assert_eq!(payload["status"], record.status.label());
            let estimated = payload.get("estimated_delivery").and_then(|v| v.as_str());
            let delivered = payload.get("delivery_date").and_then(|v| v.as_str());
            match record.status {
                OrderStatus::Delivered => {
                    assert!(estimated.is_none());
                    assert!(parse(delivered.expect("delivery date")) < now);
                }
                OrderStatus::Processing | OrderStatus::InTransit => {
                    assert!(delivered.is_none());
                    assert!(parse(estimated.expect("estimated delivery")) > now);
                }
            }
        }
    }

    #[test]
    fn fixture_statuses_match_table() {
        let book = OrderBook::fixtures(Utc::now());

        assert_eq!(book.get("ORD123456").map(|r| r.status), Some(OrderStatus::Processing));
        assert_eq!(book.get("ORD789012").map(|r| r.status), Some(OrderStatus::InTransit));
        assert_eq!(book.get("ORD345678").map(|r| r.status), Some(OrderStatus::Delivered));
    }

    #[test]
    fn unknown_order_returns_error_payload() {
        let book = OrderBook::fixtures(Utc::now());
        let report = book.track("ORD000000");

        assert!(!report.is_found());
        let payload = serde_json::to_value(report).expect("serializable report");
        assert_eq!(payload["error"], "Order not found");
        assert_eq!(payload["order_id"], "ORD000000");
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let book = OrderBook::fixtures(Utc::now());

        assert!(matches!(
            book.track("  ord789012 "),
            TrackingReport::Found { ref order_id, .. } if order_id == "ORD789012"
        ));
    }
}
