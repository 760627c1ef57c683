use super::in_flight::InFlight;
use crate::domain::cart::CartSnapshot;
use crate::domain::order::Order;
use crate::domain::ports::CheckoutServiceRef;
use crate::error::{CheckoutError, Result};
use tracing::info;

/// Turns a cart into an order.
///
/// Checkout is not idempotent on the backend, so only one checkout per cart
/// may be in flight. The initiator does not clear the cart; a returned
/// `Order` is the signal for the caller to do so.
pub struct CheckoutInitiator {
    service: CheckoutServiceRef,
    in_flight: InFlight,
    cart_key: String,
}

impl CheckoutInitiator {
    pub fn new(service: CheckoutServiceRef, in_flight: InFlight, cart_key: impl Into<String>) -> Self {
        Self {
            service,
            in_flight,
            cart_key: cart_key.into(),
        }
    }

    pub async fn checkout(&self, cart: &CartSnapshot) -> Result<Order> {
        if cart.is_empty() {
            return Err(CheckoutError::InvalidStateError(
                "cannot check out an empty cart".to_string(),
            ));
        }

        let _token = self.in_flight.acquire(format!("checkout:{}", self.cart_key))?;
        let created = self.service.checkout().await?;

        let order = Order::from_snapshot(created.id, cart.clone(), created.status);
        info!(order_id = %order.id(), total = %order.total(), lines = order.items().len(), "order created");
        Ok(order)
    }
}
