//! Decodes the backend's row-change push frames and fans them out to
//! subscribers of the `OrderChanges` port. The push transport itself (the
//! backend SDK's socket) stays outside the crate; whatever receives frames
//! feeds them into [`ChannelOrderChanges::push_frame`].

use futures::stream::BoxStream;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::order::OrderChange;
use crate::domain::ports::OrderChanges;

use super::orders::OrderRow;

const CHANGE_EVENT: &str = "postgres_changes";
const ORDERS_TABLE: &str = "orders";

#[derive(Debug, Deserialize)]
struct ChangeFrame {
    event: String,
    payload: ChangePayload,
}

#[derive(Debug, Deserialize)]
struct ChangePayload {
    data: ChangeData,
}

#[derive(Debug, Deserialize)]
struct ChangeData {
    table: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    record: Value,
    #[serde(default)]
    old_record: Value,
}

/// Decodes one push frame into an order change.
///
/// Returns `None` for frames about other relations, non-change events, and
/// rows that do not parse; a bad frame must never take the subscription down.
pub fn decode_order_change(frame: &str) -> Option<OrderChange> {
    let frame: ChangeFrame = serde_json::from_str(frame).ok()?;
    if frame.event != CHANGE_EVENT {
        return None;
    }
    let data = frame.payload.data;
    if data.table != ORDERS_TABLE {
        return None;
    }
    match data.kind.as_str() {
        "INSERT" => {
            let row: OrderRow = serde_json::from_value(data.record).ok()?;
            Some(OrderChange::Inserted(row.into_view()))
        }
        "UPDATE" => {
            let row: OrderRow = serde_json::from_value(data.record).ok()?;
            Some(OrderChange::Updated(row.into_view()))
        }
        // Deletes only carry the old row's key.
        "DELETE" => {
            let id = data.old_record.get("id")?.as_str()?;
            Some(OrderChange::Deleted(Uuid::parse_str(id).ok()?))
        }
        _ => None,
    }
}

/// Fan-out point between the frame source and any number of subscribers.
#[derive(Debug)]
pub struct ChannelOrderChanges {
    tx: broadcast::Sender<OrderChange>,
}

impl ChannelOrderChanges {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Decodes and forwards one raw frame; returns whether it carried an
    /// order change.
    pub fn push_frame(&self, frame: &str) -> bool {
        match decode_order_change(frame) {
            Some(change) => {
                self.push(change);
                true
            }
            None => false,
        }
    }

    pub fn push(&self, change: OrderChange) {
        // Send only fails when nobody is subscribed, which is not an error.
        let _ = self.tx.send(change);
    }
}

impl Default for ChannelOrderChanges {
    fn default() -> Self {
        Self::new(64)
    }
}

impl OrderChanges for ChannelOrderChanges {
    fn subscribe(&self) -> BoxStream<'static, OrderChange> {
        let rx = self.tx.subscribe();
        Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(change) => return Some((change, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("order change subscriber lagged, skipped {skipped} event(s)");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        }))
    }
}
