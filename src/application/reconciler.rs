use super::payment_session::PaymentSessionManager;
use crate::domain::order::OrderId;
use crate::domain::payment::{ConfirmationEvent, PaymentStatus};
use crate::domain::ports::PaymentServiceRef;
use crate::error::{CheckoutError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Drives the held payment's status from the payment service.
///
/// The backend is authoritative. Each status read is numbered when it is
/// issued and only the most recently issued read that completes is applied,
/// so a slow response cannot overwrite a newer one. A failed read leaves
/// the last known status in place.
pub struct StatusReconciler {
    service: PaymentServiceRef,
    session: Arc<PaymentSessionManager>,
    next_seq: AtomicU64,
}

impl StatusReconciler {
    pub fn new(service: PaymentServiceRef, session: Arc<PaymentSessionManager>) -> Self {
        Self {
            service,
            session,
            next_seq: AtomicU64::new(1),
        }
    }

    /// Queries the backend and applies the mapped status to the held payment.
    pub async fn refresh_status(&self, order_id: &OrderId) -> Result<PaymentStatus> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        debug!(%order_id, seq, "querying payment status");

        let raw = self.service.status(order_id).await?;
        let status = PaymentStatus::from_remote(&raw);
        debug!(%order_id, seq, raw = %raw, mapped = %status, "payment status received");

        self.session.apply_status(order_id, seq, status).await
    }

    /// Sends a simulated "paid" webhook for the held payment, then re-reads
    /// the status from the backend rather than assuming the event applied.
    pub async fn apply_simulated_confirmation(&self, order_id: &OrderId) -> Result<PaymentStatus> {
        let payment = self.session.payment().await.ok_or_else(|| {
            CheckoutError::NotReadyError("no PIX charge has been created yet".to_string())
        })?;

        if payment.order_id != *order_id {
            return Err(CheckoutError::InvalidStateError(format!(
                "held payment belongs to order {}, not {order_id}",
                payment.order_id
            )));
        }
        if payment.status == PaymentStatus::Paid {
            return Err(CheckoutError::InvalidStateError(format!(
                "payment {} is already paid",
                payment.payment_id
            )));
        }

        let event = ConfirmationEvent::simulated(&payment.payment_id, order_id);
        self.service.webhook(&event).await?;
        info!(%order_id, payment_id = %payment.payment_id, txid = %event.txid, "simulated confirmation sent");

        self.refresh_status(order_id).await
    }
}
