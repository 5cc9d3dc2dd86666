use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::StorefrontError;
use crate::domain::order::{parse_embedded, OrderDraft, OrderStatus, OrderView, PaymentStatus};
use crate::domain::ports::OrderRepository;

use super::client::{Filter, RestClient};

/// Row shape of the `orders` relation. `items` and `address` hold JSON that
/// may itself be wrapped in a string; `into_view` parses both leniently.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub nursery_id: Option<Uuid>,
    #[serde(default)]
    pub items: Value,
    pub quantity: u32,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub address: Value,
    pub created_at: DateTime<Utc>,
}

impl OrderRow {
    pub(crate) fn into_view(self) -> OrderView {
        OrderView {
            id: self.id,
            customer_id: self.user_id,
            nursery_id: self.nursery_id,
            items: parse_embedded(&self.items).unwrap_or_default(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
            status: self.status,
            payment_status: self.payment_status,
            payment_ref: self.razorpay_payment_id,
            address: parse_embedded(&self.address),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewOrderRow {
    user_id: Uuid,
    nursery_id: Option<Uuid>,
    items: String,
    quantity: u32,
    unit_price: BigDecimal,
    total_price: BigDecimal,
    status: OrderStatus,
    payment_status: PaymentStatus,
    razorpay_payment_id: String,
    address: String,
}

impl NewOrderRow {
    fn from_draft(draft: OrderDraft) -> Result<Self, StorefrontError> {
        // The row embeds the line and the address as JSON-encoded strings.
        let items = serde_json::to_string(&[&draft.item]).map_err(encode_error)?;
        let address = serde_json::to_string(&draft.address).map_err(encode_error)?;
        Ok(Self {
            user_id: draft.customer_id,
            nursery_id: draft.nursery_id,
            items,
            quantity: draft.quantity,
            unit_price: draft.unit_price,
            total_price: draft.total_price,
            status: draft.status,
            payment_status: draft.payment_status,
            razorpay_payment_id: draft.payment_ref,
            address,
        })
    }
}

fn encode_error(e: serde_json::Error) -> StorefrontError {
    StorefrontError::RemoteRequestFailed(format!("orders: payload encoding failed: {e}"))
}

/// `orders` relation.
pub struct RestOrderRepository {
    client: RestClient,
}

impl RestOrderRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

impl OrderRepository for RestOrderRepository {
    async fn insert_batch(&self, drafts: Vec<OrderDraft>) -> Result<Vec<Uuid>, StorefrontError> {
        let rows = drafts
            .into_iter()
            .map(NewOrderRow::from_draft)
            .collect::<Result<Vec<_>, _>>()?;
        let stored: Vec<OrderRow> = self.client.insert("orders", &rows).await?;
        Ok(stored.into_iter().map(|row| row.id).collect())
    }

    async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<OrderView>, StorefrontError> {
        let rows: Vec<OrderRow> = self
            .client
            .select(
                "orders",
                &[Filter::Eq("user_id", customer_id.to_string())],
                Some("created_at.desc"),
            )
            .await?;
        Ok(rows.into_iter().map(OrderRow::into_view).collect())
    }

    async fn list_for_nursery(&self, nursery_id: Uuid) -> Result<Vec<OrderView>, StorefrontError> {
        let rows: Vec<OrderRow> = self
            .client
            .select(
                "orders",
                &[Filter::Eq("nursery_id", nursery_id.to_string())],
                Some("created_at.desc"),
            )
            .await?;
        Ok(rows.into_iter().map(OrderRow::into_view).collect())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), StorefrontError> {
        self.client
            .update(
                "orders",
                &[Filter::Eq("id", id.to_string())],
                &serde_json::json!({ "status": status }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::address::Address;
    use crate::domain::order::drafts_from_lines;
    use crate::domain::cart::{CartLineInput, CartStore};

    fn row_json(items: Value, address: Value) -> Value {
        json!({
            "id": "7c8d21f4-3f30-47e5-a1fc-6e9d2f9c51b2",
            "user_id": "2f0cb21e-11b7-4db2-8c3f-4a2f5fb4d6b1",
            "nursery_id": null,
            "items": items,
            "quantity": 2,
            "unit_price": 150,
            "total_price": 300,
            "status": "Order Placed",
            "payment_status": "Paid",
            "razorpay_payment_id": "pay_123",
            "address": address,
            "created_at": "2025-07-01T10:00:00Z"
        })
    }

    fn embedded_item() -> Value {
        json!([{
            "id": "0cc9d9ce-4c2f-44f3-9f29-14c0e7d0e4a1",
            "name": "Fern",
            "price": 150,
            "quantity": 2,
            "image_url": "https://img.example/fern.jpg"
        }])
    }

    #[test]
    fn string_wrapped_items_and_address_parse() {
        let items = Value::String(embedded_item().to_string());
        let address = Value::String(json!({"name": "Asha", "phone": "1"}).to_string());
        let row: OrderRow = serde_json::from_value(row_json(items, address)).expect("row parses");

        let view = row.into_view();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].name, "Fern");
        assert_eq!(view.address.expect("address parses").name, "Asha");
        assert_eq!(view.status, OrderStatus::OrderPlaced);
    }

    #[test]
    fn direct_json_items_parse_too() {
        let row: OrderRow =
            serde_json::from_value(row_json(embedded_item(), json!({"name": "Asha", "phone": "1"})))
                .expect("row parses");

        let view = row.into_view();
        assert_eq!(view.items.len(), 1);
        assert!(view.address.is_some());
    }

    #[test]
    fn unparseable_embedded_fields_degrade_to_empty() {
        let row: OrderRow =
            serde_json::from_value(row_json(json!("not json"), Value::Null)).expect("row parses");

        let view = row.into_view();
        assert!(view.items.is_empty());
        assert!(view.address.is_none());
    }

    #[test]
    fn draft_rows_embed_line_and_address_as_strings() {
        let mut cart = CartStore::new();
        cart.add_item(CartLineInput {
            plant_id: Uuid::new_v4(),
            name: "Fern".to_string(),
            unit_price: BigDecimal::from(150),
            image_url: String::new(),
            nursery_id: None,
        });
        let address = Address {
            id: None,
            user_id: None,
            name: "Asha".to_string(),
            phone: "1".to_string(),
            address_line: Some("12 Garden Lane".to_string()),
            city: None,
            postal_code: None,
            is_default: false,
        };
        let drafts = drafts_from_lines(Uuid::new_v4(), cart.lines(), &address, "pay_123");

        let row = NewOrderRow::from_draft(drafts[0].clone()).expect("encodes");
        assert_eq!(row.razorpay_payment_id, "pay_123");

        let embedded: Vec<crate::domain::order::OrderItemSnapshot> =
            serde_json::from_str(&row.items).expect("items round-trip");
        assert_eq!(embedded.len(), 1);
        assert_eq!(embedded[0].name, "Fern");

        let embedded_address: Address =
            serde_json::from_str(&row.address).expect("address round-trips");
        assert_eq!(embedded_address.name, "Asha");
    }
}
