//! Order tracking for customers and status management for nurseries.

use crate::domain::errors::StorefrontError;
use crate::domain::order::{OrderChange, OrderStatus, OrderView};
use crate::domain::ports::{AuthGateway, OrderRepository};

use super::require_user;

/// The signed-in customer's own orders.
pub struct CustomerOrders<A, O> {
    auth: A,
    orders: O,
}

impl<A: AuthGateway, O: OrderRepository> CustomerOrders<A, O> {
    pub fn new(auth: A, orders: O) -> Self {
        Self { auth, orders }
    }

    /// Newest first.
    pub async fn my_orders(&self) -> Result<Vec<OrderView>, StorefrontError> {
        let user = require_user(&self.auth).await?;
        self.orders.list_for_customer(user.id).await
    }

    /// Cancels one of the customer's own orders, as long as it has not
    /// already reached a terminal status.
    pub async fn cancel(&self, order: &OrderView) -> Result<(), StorefrontError> {
        let user = require_user(&self.auth).await?;
        if order.customer_id != user.id {
            return Err(StorefrontError::NotFound);
        }
        if order.status.is_terminal() {
            return Err(StorefrontError::InvalidStatusChange {
                from: order.status.to_string(),
                to: OrderStatus::Cancelled.to_string(),
            });
        }
        self.orders
            .update_status(order.id, OrderStatus::Cancelled)
            .await
    }
}

/// The nursery dashboard's side: incoming orders and fulfilment moves.
pub struct NurseryOrders<A, O> {
    auth: A,
    orders: O,
}

impl<A: AuthGateway, O: OrderRepository> NurseryOrders<A, O> {
    pub fn new(auth: A, orders: O) -> Self {
        Self { auth, orders }
    }

    pub async fn incoming(&self) -> Result<Vec<OrderView>, StorefrontError> {
        let user = require_user(&self.auth).await?;
        self.orders.list_for_nursery(user.id).await
    }

    /// Moves an order along the fulfilment workflow. Only the transitions in
    /// [`OrderStatus::allowed_next`] are accepted.
    pub async fn advance(
        &self,
        order: &OrderView,
        next: OrderStatus,
    ) -> Result<(), StorefrontError> {
        require_user(&self.auth).await?;
        if !order.status.can_become(next) {
            return Err(StorefrontError::InvalidStatusChange {
                from: order.status.to_string(),
                to: next.to_string(),
            });
        }
        self.orders.update_status(order.id, next).await
    }
}

/// Client-side cache of an order listing, kept current by merge-patching
/// row-change events by id. Both the customer and the nursery views feed
/// their subscription into one of these.
#[derive(Debug, Default)]
pub struct OrderBoard {
    orders: Vec<OrderView>,
}

impl OrderBoard {
    pub fn seeded(orders: Vec<OrderView>) -> Self {
        Self { orders }
    }

    pub fn orders(&self) -> &[OrderView] {
        &self.orders
    }

    pub fn apply(&mut self, change: OrderChange) {
        match change {
            OrderChange::Updated(updated) => {
                if let Some(existing) = self.orders.iter_mut().find(|o| o.id == updated.id) {
                    *existing = updated;
                }
            }
            OrderChange::Inserted(order) => {
                if !self.orders.iter().any(|o| o.id == order.id) {
                    self.orders.insert(0, order);
                }
            }
            OrderChange::Deleted(id) => {
                self.orders.retain(|o| o.id != id);
            }
        }
    }
}
