//! Contracts for the remote collaborators the checkout flow talks to.
//!
//! Every call is a suspension point. Implementations report transport and
//! backend failures as `CheckoutError::RemoteError`.

use super::cart::{CartItem, ProductRef, Quantity};
use super::order::{OrderId, OrderStatus, OrderSummary};
use super::payment::{ConfirmationEvent, PixCharge};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The cart as reported by the cart service.
///
/// `total` is informational only; callers recompute it from `items`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCart {
    pub items: Vec<CartItem>,
    pub total: Option<rust_decimal::Decimal>,
}

impl RemoteCart {
    pub fn line(&self, product_ref: &ProductRef) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_ref == product_ref)
    }
}

/// The order the checkout service reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOrder {
    pub id: OrderId,
    pub status: OrderStatus,
}

#[async_trait]
pub trait CartService: Send + Sync {
    async fn fetch(&self) -> Result<RemoteCart>;
    async fn add(&self, product_ref: &ProductRef, quantity: Quantity) -> Result<RemoteCart>;
    async fn remove(&self, product_ref: &ProductRef) -> Result<RemoteCart>;
    async fn clear(&self) -> Result<RemoteCart>;
}

#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Converts the buyer's server-side cart into an order.
    async fn checkout(&self) -> Result<CreatedOrder>;
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn create_pix(&self, order_id: &OrderId) -> Result<PixCharge>;
    /// Returns the raw status string; mapping is the caller's concern.
    async fn status(&self, order_id: &OrderId) -> Result<String>;
    async fn webhook(&self, event: &ConfirmationEvent) -> Result<()>;
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn list(&self) -> Result<Vec<OrderSummary>>;
}

pub type CartServiceRef = Arc<dyn CartService>;
pub type CheckoutServiceRef = Arc<dyn CheckoutService>;
pub type PaymentServiceRef = Arc<dyn PaymentService>;
pub type OrderServiceRef = Arc<dyn OrderService>;

/// A backend that serves every collaborator, like the storefront REST API.
pub trait Marketplace: CartService + CheckoutService + PaymentService + OrderService {}

impl<T> Marketplace for T where T: CartService + CheckoutService + PaymentService + OrderService {}
