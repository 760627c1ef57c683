use crate::domain::order::{OrderStatus, OrderSummary};
use crate::domain::ports::OrderServiceRef;
use crate::error::Result;
use tracing::debug;

/// Read-only projection over the buyer's past orders.
pub struct OrderHistoryView {
    service: OrderServiceRef,
}

impl OrderHistoryView {
    pub fn new(service: OrderServiceRef) -> Self {
        Self { service }
    }

    pub async fn list(&self) -> Result<Vec<OrderSummary>> {
        let orders = self.service.list().await?;
        debug!(count = orders.len(), "order history loaded");
        Ok(orders)
    }

    /// `None` lists every order.
    pub async fn list_by_status(&self, status: Option<OrderStatus>) -> Result<Vec<OrderSummary>> {
        let orders = self.list().await?;
        Ok(match status {
            Some(status) => orders.into_iter().filter(|o| o.status == status).collect(),
            None => orders,
        })
    }
}
