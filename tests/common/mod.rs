#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pixcart::domain::cart::{Cart, CartItem, Price, ProductRef, Quantity};
use pixcart::domain::order::{Order, OrderId, OrderStatus};
use pixcart::domain::payment::{ConfirmationEvent, PaymentId, PixCharge, PixCode};
use pixcart::domain::ports::{CheckoutService, CreatedOrder, PaymentService};
use pixcart::error::{CheckoutError, Result};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

/// Builds a pending order with a single line totalling `total`.
pub fn order(id: &str, total: Decimal) -> Order {
    let mut cart = Cart::new();
    cart.add(CartItem::new(
        ProductRef::new("p3"),
        Quantity::ONE,
        Price::new(total).unwrap(),
    ));
    Order::from_snapshot(OrderId::new(id), cart.snapshot(), OrderStatus::Pending)
}

/// One scripted answer to a status query.
pub struct StatusReply {
    result: Result<String>,
    gate: Option<oneshot::Receiver<()>>,
}

impl StatusReply {
    pub fn ok(status: &str) -> Self {
        Self {
            result: Ok(status.to_string()),
            gate: None,
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            result: Err(CheckoutError::remote_status(503, message)),
            gate: None,
        }
    }

    /// Held back until the returned sender fires.
    pub fn gated(status: &str) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let reply = Self {
            result: Ok(status.to_string()),
            gate: Some(rx),
        };
        (reply, tx)
    }
}

/// Payment service fake that counts calls and replays scripted statuses.
///
/// With no scripted reply left, `status` reports what the last webhook set
/// (initially "pending").
pub struct ScriptedPayments {
    amount: Decimal,
    replies: Mutex<VecDeque<StatusReply>>,
    current: Mutex<String>,
    pub create_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub webhook_calls: AtomicUsize,
    pub webhook_events: Mutex<Vec<ConfirmationEvent>>,
    create_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedPayments {
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount,
            replies: Mutex::new(VecDeque::new()),
            current: Mutex::new("pending".to_string()),
            create_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            webhook_calls: AtomicUsize::new(0),
            webhook_events: Mutex::new(Vec::new()),
            create_gate: Mutex::new(None),
        }
    }

    pub fn push_reply(&self, reply: StatusReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Holds the next `create_pix` call until the returned sender fires.
    pub fn gate_next_create(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.create_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn webhooks(&self) -> usize {
        self.webhook_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentService for ScriptedPayments {
    async fn create_pix(&self, order_id: &OrderId) -> Result<PixCharge> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let gate = self.create_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(PixCharge {
            payment_id: PaymentId::new(format!("pay_{n}")),
            order_id: order_id.clone(),
            amount: Price::new(self.amount).unwrap(),
            pix: PixCode {
                qr_code: format!("QR:{order_id}"),
                copy_paste: format!("000201{order_id}"),
            },
            expires_at: DateTime::<Utc>::from_timestamp(1_800_000_000, 0).unwrap(),
        })
    }

    async fn status(&self, _order_id: &OrderId) -> Result<String> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(StatusReply { result, gate }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            }
            None => Ok(self.current.lock().unwrap().clone()),
        }
    }

    async fn webhook(&self, event: &ConfirmationEvent) -> Result<()> {
        self.webhook_calls.fetch_add(1, Ordering::SeqCst);
        self.webhook_events.lock().unwrap().push(event.clone());
        *self.current.lock().unwrap() = event.status.clone();
        Ok(())
    }
}

/// Checkout service fake that counts calls and can hold a call open.
#[derive(Default)]
pub struct GatedCheckout {
    pub calls: AtomicUsize,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedCheckout {
    pub fn gate_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckoutService for GatedCheckout {
    async fn checkout(&self) -> Result<CreatedOrder> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(CreatedOrder {
            id: OrderId::new(format!("ord_{n}")),
            status: OrderStatus::Pending,
        })
    }
}
