use super::in_flight::InFlight;
use crate::domain::order::{Order, OrderId};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::ports::PaymentServiceRef;
use crate::error::{CheckoutError, Result};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct SessionState {
    payment: Option<Payment>,
    /// Sequence number of the last status read applied to `payment`.
    applied_seq: u64,
}

/// Holds the PIX charge for the active checkout.
///
/// At most one payment is held. Its status is advanced only through
/// [`StatusReconciler`](super::reconciler::StatusReconciler).
pub struct PaymentSessionManager {
    service: PaymentServiceRef,
    in_flight: InFlight,
    state: RwLock<SessionState>,
}

impl PaymentSessionManager {
    pub fn new(service: PaymentServiceRef, in_flight: InFlight) -> Self {
        Self {
            service,
            in_flight,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Requests a PIX charge for `order` and holds the result as `pending`.
    ///
    /// The charge must be for exactly the order's total; anything else is
    /// treated as a backend fault and nothing is stored.
    pub async fn create_pix_charge(&self, order: &Order) -> Result<Payment> {
        let _token = self.in_flight.acquire(format!("pix:{}", order.id()))?;
        let charge = self.service.create_pix(order.id()).await?;

        if charge.order_id != *order.id() {
            return Err(CheckoutError::remote(format!(
                "charge was issued for order {} instead of {}",
                charge.order_id,
                order.id()
            )));
        }
        if charge.amount != order.total() {
            return Err(CheckoutError::remote(format!(
                "charge amount {} does not match order total {}",
                charge.amount,
                order.total()
            )));
        }

        let payment = charge.into_payment();
        info!(
            order_id = %payment.order_id,
            payment_id = %payment.payment_id,
            amount = %payment.amount,
            expires_at = %payment.expires_at,
            "PIX charge created"
        );

        let mut state = self.state.write().await;
        state.payment = Some(payment.clone());
        state.applied_seq = 0;
        Ok(payment)
    }

    pub async fn copy_paste_code(&self) -> Result<String> {
        self.read(|p| p.pix.copy_paste.clone()).await
    }

    pub async fn qr_payload(&self) -> Result<String> {
        self.read(|p| p.pix.qr_code.clone()).await
    }

    pub async fn expiry(&self) -> Result<DateTime<Utc>> {
        self.read(|p| p.expires_at).await
    }

    pub async fn is_expired(&self, now: DateTime<Utc>) -> Result<bool> {
        self.read(|p| p.is_expired(now)).await
    }

    pub async fn payment(&self) -> Option<Payment> {
        self.state.read().await.payment.clone()
    }

    /// Local status, `Unknown` while no charge is held.
    pub async fn status(&self) -> PaymentStatus {
        self.state
            .read()
            .await
            .payment
            .as_ref()
            .map_or(PaymentStatus::Unknown, |p| p.status)
    }

    async fn read<T>(&self, f: impl FnOnce(&Payment) -> T) -> Result<T> {
        let state = self.state.read().await;
        state.payment.as_ref().map(f).ok_or_else(|| {
            CheckoutError::NotReadyError("no PIX charge has been created yet".to_string())
        })
    }

    /// Applies a status read issued with sequence number `seq`.
    ///
    /// Reads older than the last applied one are dropped, and a terminal
    /// status is never replaced. Returns the status in effect afterwards.
    pub(crate) async fn apply_status(
        &self,
        order_id: &OrderId,
        seq: u64,
        status: PaymentStatus,
    ) -> Result<PaymentStatus> {
        let mut state = self.state.write().await;
        let applied_seq = state.applied_seq;
        let payment = state.payment.as_mut().ok_or_else(|| {
            CheckoutError::NotReadyError("no PIX charge has been created yet".to_string())
        })?;

        if payment.order_id != *order_id {
            return Err(CheckoutError::InvalidStateError(format!(
                "held payment belongs to order {}, not {order_id}",
                payment.order_id
            )));
        }

        if seq <= applied_seq {
            debug!(%order_id, seq, applied_seq, stale = %status, "discarding out-of-order status read");
            return Ok(payment.status);
        }

        if payment.status.is_terminal() && payment.status != status {
            warn!(%order_id, current = %payment.status, reported = %status, "ignoring status change after settlement");
        } else if payment.status != status {
            info!(%order_id, from = %payment.status, to = %status, "payment status changed");
            payment.status = status;
        }

        let current = payment.status;
        state.applied_seq = seq;
        Ok(current)
    }
}
