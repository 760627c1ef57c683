use crate::domain::cart::{Cart, CartItem, Price, ProductRef, Quantity};
use crate::domain::order::{OrderId, OrderLine, OrderStatus, OrderSummary};
use crate::domain::payment::{ConfirmationEvent, PaymentId, PaymentStatus, PixCharge, PixCode};
use crate::domain::ports::{
    CartService, CheckoutService, CreatedOrder, OrderService, PaymentService, RemoteCart,
};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// How long a PIX charge stays payable.
pub const PIX_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
struct PaymentRecord {
    charge: PixCharge,
    status: PaymentStatus,
}

#[derive(Debug, Default)]
struct MarketState {
    catalog: HashMap<ProductRef, Price>,
    cart: Cart,
    orders: Vec<OrderSummary>,
    payments: HashMap<OrderId, PaymentRecord>,
    webhook_events: Vec<ConfirmationEvent>,
    next_order: u64,
    next_payment: u64,
}

/// A thread-safe in-memory storefront backend.
///
/// Plays the part of every remote collaborator for one buyer: a catalogue,
/// the server-side cart, orders and PIX payments. Ids are sequential
/// (`ord_1`, `pay_1`, ...) so runs are reproducible.
#[derive(Default, Clone)]
pub struct InMemoryMarketplace {
    state: Arc<RwLock<MarketState>>,
}

impl InMemoryMarketplace {
    /// Creates an empty marketplace with no products.
    pub fn new() -> Self {
        Self::default()
    }

    /// A marketplace listing `p1` at 10.00, `p2` at 5.00 and `p3` at 42.50.
    pub fn with_demo_catalog() -> Self {
        Self::with_catalog([
            ("p1", dec!(10.00)),
            ("p2", dec!(5.00)),
            ("p3", dec!(42.50)),
        ])
    }

    /// Products with negative prices are skipped.
    pub fn with_catalog<'a>(products: impl IntoIterator<Item = (&'a str, Decimal)>) -> Self {
        let catalog = products
            .into_iter()
            .filter_map(|(id, price)| Price::new(price).ok().map(|p| (ProductRef::new(id), p)))
            .collect();
        Self {
            state: Arc::new(RwLock::new(MarketState {
                catalog,
                ..Default::default()
            })),
        }
    }

    /// Every webhook event received so far, in arrival order.
    pub async fn webhook_events(&self) -> Vec<ConfirmationEvent> {
        self.state.read().await.webhook_events.clone()
    }

    fn remote_cart(cart: &Cart) -> RemoteCart {
        RemoteCart {
            items: cart.items().to_vec(),
            total: Some(cart.total().value()),
        }
    }
}

#[async_trait]
impl CartService for InMemoryMarketplace {
    async fn fetch(&self) -> Result<RemoteCart> {
        let state = self.state.read().await;
        Ok(Self::remote_cart(&state.cart))
    }

    async fn add(&self, product_ref: &ProductRef, quantity: Quantity) -> Result<RemoteCart> {
        let mut state = self.state.write().await;
        let price = *state.catalog.get(product_ref).ok_or_else(|| {
            CheckoutError::remote_status(404, format!("product {product_ref} not found"))
        })?;
        state
            .cart
            .add(CartItem::new(product_ref.clone(), quantity, price));
        Ok(Self::remote_cart(&state.cart))
    }

    async fn remove(&self, product_ref: &ProductRef) -> Result<RemoteCart> {
        let mut state = self.state.write().await;
        state.cart.remove(product_ref);
        Ok(Self::remote_cart(&state.cart))
    }

    async fn clear(&self) -> Result<RemoteCart> {
        let mut state = self.state.write().await;
        state.cart.clear();
        Ok(Self::remote_cart(&state.cart))
    }
}

#[async_trait]
impl CheckoutService for InMemoryMarketplace {
    async fn checkout(&self) -> Result<CreatedOrder> {
        let mut state = self.state.write().await;
        if state.cart.is_empty() {
            return Err(CheckoutError::remote_status(400, "cart is empty"));
        }

        state.next_order += 1;
        let id = OrderId::new(format!("ord_{}", state.next_order));
        let items = state
            .cart
            .items()
            .iter()
            .map(|item| OrderLine {
                product_ref: item.product_ref.to_string(),
                title: None,
                quantity: item.quantity.get(),
                unit_price: item.unit_price,
            })
            .collect();
        let summary = OrderSummary {
            id: id.clone(),
            status: OrderStatus::Pending,
            total: state.cart.total(),
            created_at: Some(Utc::now()),
            items,
        };
        state.orders.push(summary);
        state.cart.clear();

        Ok(CreatedOrder {
            id,
            status: OrderStatus::Pending,
        })
    }
}

#[async_trait]
impl PaymentService for InMemoryMarketplace {
    async fn create_pix(&self, order_id: &OrderId) -> Result<PixCharge> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .iter()
            .find(|o| &o.id == order_id)
            .ok_or_else(|| CheckoutError::remote_status(404, format!("order {order_id} not found")))?;
        if order.status != OrderStatus::Pending {
            return Err(CheckoutError::remote_status(
                409,
                format!("order {order_id} is {}", order.status),
            ));
        }
        let amount = order.total;

        state.next_payment += 1;
        let payment_id = PaymentId::new(format!("pay_{}", state.next_payment));
        let charge = PixCharge {
            pix: PixCode {
                qr_code: format!("PIX-QR:{payment_id}:{amount}"),
                copy_paste: format!("00020126PIX{payment_id}{order_id}5204000053039865405{amount}"),
            },
            payment_id,
            order_id: order_id.clone(),
            amount,
            expires_at: Utc::now() + Duration::minutes(PIX_TTL_MINUTES),
        };
        state.payments.insert(
            order_id.clone(),
            PaymentRecord {
                charge: charge.clone(),
                status: PaymentStatus::Pending,
            },
        );
        Ok(charge)
    }

    async fn status(&self, order_id: &OrderId) -> Result<String> {
        let state = self.state.read().await;
        state
            .payments
            .get(order_id)
            .map(|record| record.status.as_str().to_string())
            .ok_or_else(|| {
                CheckoutError::remote_status(404, format!("no payment for order {order_id}"))
            })
    }

    async fn webhook(&self, event: &ConfirmationEvent) -> Result<()> {
        let mut state = self.state.write().await;
        state.webhook_events.push(event.clone());

        let record = state
            .payments
            .get_mut(&event.order_id)
            .filter(|r| r.charge.payment_id == event.payment_id)
            .ok_or_else(|| {
                CheckoutError::remote_status(404, format!("payment {} not found", event.payment_id))
            })?;
        let status = PaymentStatus::from_remote(&event.status);
        if record.status.is_terminal() {
            return Ok(());
        }
        record.status = status;

        if status == PaymentStatus::Paid
            && let Some(order) = state.orders.iter_mut().find(|o| o.id == event.order_id)
        {
            order.status = OrderStatus::Paid;
        }
        Ok(())
    }
}

#[async_trait]
impl OrderService for InMemoryMarketplace {
    async fn list(&self) -> Result<Vec<OrderSummary>> {
        Ok(self.state.read().await.orders.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cart_merges_and_prices_from_catalog() {
        let market = InMemoryMarketplace::with_demo_catalog();
        market.add(&"p1".into(), Quantity::new(2).unwrap()).await.unwrap();
        let cart = market.add(&"p1".into(), Quantity::ONE).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity.get(), 3);
        assert_eq!(cart.total, Some(dec!(30.00)));
    }

    #[tokio::test]
    async fn test_unknown_product_is_404() {
        let market = InMemoryMarketplace::with_demo_catalog();
        let result = market.add(&"zzz".into(), Quantity::ONE).await;
        assert!(matches!(result, Err(CheckoutError::RemoteError { status: Some(404), .. })));
    }

    #[tokio::test]
    async fn test_checkout_clears_cart_and_records_order() {
        let market = InMemoryMarketplace::with_demo_catalog();
        market.add(&"p2".into(), Quantity::new(3).unwrap()).await.unwrap();

        let created = market.checkout().await.unwrap();
        assert_eq!(created.id.as_str(), "ord_1");
        assert!(market.fetch().await.unwrap().items.is_empty());

        let orders = OrderService::list(&market).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].total.value(), dec!(15.00));
        assert_eq!(orders[0].items[0].line_total().value(), dec!(15.00));
    }

    #[tokio::test]
    async fn test_webhook_settles_payment_and_order() {
        let market = InMemoryMarketplace::with_demo_catalog();
        market.add(&"p3".into(), Quantity::ONE).await.unwrap();
        let order = market.checkout().await.unwrap();
        let charge = market.create_pix(&order.id).await.unwrap();
        assert_eq!(market.status(&order.id).await.unwrap(), "pending");

        market
            .webhook(&ConfirmationEvent::simulated(&charge.payment_id, &order.id))
            .await
            .unwrap();

        assert_eq!(market.status(&order.id).await.unwrap(), "paid");
        let orders = OrderService::list(&market).await.unwrap();
        assert_eq!(orders[0].status, OrderStatus::Paid);

        // A paid order cannot be charged again
        let again = market.create_pix(&order.id).await;
        assert!(matches!(again, Err(CheckoutError::RemoteError { status: Some(409), .. })));
    }
}
