use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use super::address::Address;
use super::cart::CartLine;
use super::pricing;

/// Lifecycle of a stored order, driven from the nursery dashboard. The
/// forward states may each jump to any later forward state; `Delivered` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    OrderPlaced,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Stored label. Existing rows mix capitalisations, so parsing is
    /// case-insensitive; writing always uses these.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::OrderPlaced => "order placed",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// The statuses a nursery may move an order to from here.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            OrderPlaced => &[Confirmed, Processing, Shipped, Delivered],
            Confirmed => &[Processing, Shipped, Delivered],
            Processing => &[Shipped, Delivered],
            Shipped => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_become(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "order placed" => Ok(OrderStatus::OrderPlaced),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|()| serde::de::Error::custom(format!("unknown order status '{s}'")))
    }
}

/// Orders are only ever persisted after a successful payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
}

impl Serialize for PaymentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("Paid")
    }
}

impl<'de> Deserialize<'de> for PaymentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("paid") {
            Ok(PaymentStatus::Paid)
        } else {
            Err(serde::de::Error::custom(format!(
                "unknown payment status '{s}'"
            )))
        }
    }
}

/// The line as embedded inside an order row's `items` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub quantity: u32,
    #[serde(default)]
    pub image_url: String,
}

impl From<&CartLine> for OrderItemSnapshot {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.plant_id,
            name: line.name.clone(),
            price: line.unit_price.clone(),
            quantity: line.quantity,
            image_url: line.image_url.clone(),
        }
    }
}

/// Ephemeral record assembled at checkout, one per cart line. Handed to the
/// order store as a batch and never kept afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub customer_id: Uuid,
    pub nursery_id: Option<Uuid>,
    pub item: OrderItemSnapshot,
    pub quantity: u32,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_ref: String,
    pub address: Address,
}

/// Builds one draft per line: the per-line order splitting is documented
/// behavior, not an aggregation bug. Every draft shares the payment
/// reference and the address snapshot.
pub fn drafts_from_lines(
    customer_id: Uuid,
    lines: &[CartLine],
    address: &Address,
    payment_ref: &str,
) -> Vec<OrderDraft> {
    lines
        .iter()
        .map(|line| OrderDraft {
            customer_id,
            nursery_id: line.nursery_id,
            item: OrderItemSnapshot::from(line),
            quantity: line.quantity,
            unit_price: line.unit_price.clone(),
            total_price: pricing::line_total(line),
            status: OrderStatus::OrderPlaced,
            payment_status: PaymentStatus::Paid,
            payment_ref: payment_ref.to_string(),
            address: address.clone(),
        })
        .collect()
}

/// Read model for an order row, with the embedded JSON fields parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub nursery_id: Option<Uuid>,
    pub items: Vec<OrderItemSnapshot>,
    pub quantity: u32,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_ref: Option<String>,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
}

/// One row-change event for the orders relation, as pushed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderChange {
    Inserted(OrderView),
    Updated(OrderView),
    Deleted(Uuid),
}

/// Leniently parses a field that holds either JSON or a JSON-encoded string.
/// Stored rows contain both shapes, so readers accept either.
pub fn parse_embedded<T: DeserializeOwned>(value: &Value) -> Option<T> {
    match value {
        Value::Null => None,
        Value::String(text) => serde_json::from_str(text).ok(),
        other => serde_json::from_value(other.clone()).ok(),
    }
}
