use super::cart_store::CartStore;
use super::checkout::CheckoutInitiator;
use super::in_flight::InFlight;
use super::order_history::OrderHistoryView;
use super::payment_session::PaymentSessionManager;
use super::reconciler::StatusReconciler;
use crate::domain::cart::{CartSnapshot, ProductRef};
use crate::domain::order::{Order, OrderId};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::ports::Marketplace;
use crate::domain::session::SessionContext;
use crate::error::{CheckoutError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Cart → checkout → payment lifecycle for one logged-in buyer.
///
/// Owns the cart mirror, the current order and the current payment session.
/// Built at login from an explicit [`SessionContext`] and torn down by
/// [`logout`](Self::logout).
pub struct CheckoutCoordinator {
    session: SessionContext,
    cart: CartStore,
    checkout: CheckoutInitiator,
    payments: Arc<PaymentSessionManager>,
    reconciler: StatusReconciler,
    history: OrderHistoryView,
    order: RwLock<Option<Order>>,
}

impl CheckoutCoordinator {
    /// Starts a buyer session against `backend` and loads the buyer's
    /// server-side cart into the local mirror.
    ///
    /// Only buyers own a cart, so any other role is rejected.
    pub async fn login<B>(session: SessionContext, backend: Arc<B>) -> Result<Self>
    where
        B: Marketplace + 'static,
    {
        if !session.is_buyer() {
            return Err(CheckoutError::InvalidStateError(format!(
                "user {} is not a buyer",
                session.user_id()
            )));
        }

        let in_flight = InFlight::new();
        let payments = Arc::new(PaymentSessionManager::new(backend.clone(), in_flight.clone()));
        let coordinator = Self {
            cart: CartStore::new(backend.clone()),
            checkout: CheckoutInitiator::new(backend.clone(), in_flight, session.user_id()),
            reconciler: StatusReconciler::new(backend.clone(), payments.clone()),
            history: OrderHistoryView::new(backend),
            payments,
            order: RwLock::new(None),
            session,
        };
        let cart = coordinator.cart.reload().await?;
        info!(
            user_id = %coordinator.session.user_id(),
            cart_lines = cart.items.len(),
            "buyer session started"
        );
        Ok(coordinator)
    }

    /// Ends the session, dropping every local mirror. Returns the user id.
    pub fn logout(self) -> String {
        let user_id = self.session.user_id().to_string();
        info!(user_id = %user_id, "buyer session ended");
        user_id
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn payments(&self) -> &PaymentSessionManager {
        &self.payments
    }

    pub fn reconciler(&self) -> &StatusReconciler {
        &self.reconciler
    }

    pub fn history(&self) -> &OrderHistoryView {
        &self.history
    }

    pub async fn add_to_cart(&self, product_ref: &ProductRef, quantity: Option<u32>) -> Result<CartSnapshot> {
        self.cart.add(product_ref, quantity).await
    }

    /// Checks out the current cart and resyncs the cart afterwards.
    ///
    /// On failure the cart is left as it was so the buyer can retry.
    pub async fn checkout(&self) -> Result<Order> {
        let snapshot = self.cart.snapshot().await;
        let order = self.checkout.checkout(&snapshot).await?;
        *self.order.write().await = Some(order.clone());

        // The order supersedes the cart even if the resync fails.
        if let Err(err) = self.cart.reload().await {
            warn!(error = %err, "cart reload after checkout failed; clearing local cart");
            self.cart.discard_local().await;
        }
        Ok(order)
    }

    pub async fn current_order(&self) -> Option<Order> {
        self.order.read().await.clone()
    }

    /// Creates the PIX charge for the order produced by the last checkout.
    pub async fn pay_current_order(&self) -> Result<Payment> {
        let order = self.current_order().await.ok_or_else(|| {
            CheckoutError::NotReadyError("no order has been checked out yet".to_string())
        })?;
        self.payments.create_pix_charge(&order).await
    }

    pub async fn refresh_payment(&self) -> Result<PaymentStatus> {
        let order_id = self.current_order_id().await?;
        self.reconciler.refresh_status(&order_id).await
    }

    pub async fn simulate_payment(&self) -> Result<PaymentStatus> {
        let order_id = self.current_order_id().await?;
        self.reconciler.apply_simulated_confirmation(&order_id).await
    }

    async fn current_order_id(&self) -> Result<OrderId> {
        self.order
            .read()
            .await
            .as_ref()
            .map(|o| o.id().clone())
            .ok_or_else(|| CheckoutError::NotReadyError("no order has been checked out yet".to_string()))
    }
}
