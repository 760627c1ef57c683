use super::cart::Price;
use super::order::OrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Local view of a payment's settlement state.
///
/// `Paid` and `Failed` are terminal. `Unknown` is only ever reported while no
/// charge has been created yet; a created payment starts at `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    #[default]
    Unknown,
}

impl PaymentStatus {
    /// Maps the backend's status string. Anything that is not a settled
    /// outcome counts as still pending.
    pub fn from_remote(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "paid" | "pago" => Self::Paid,
            "failed" | "falhou" => Self::Failed,
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The PIX artifact: a machine-readable QR payload and a human-copyable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixCode {
    pub qr_code: String,
    pub copy_paste: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub amount: Price,
    pub pix: PixCode,
    pub expires_at: DateTime<Utc>,
    pub status: PaymentStatus,
}

impl Payment {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// What the payment service returns when a PIX charge is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixCharge {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub amount: Price,
    pub pix: PixCode,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub expires_at: DateTime<Utc>,
}

/// Accepts either an RFC 3339 string or epoch milliseconds.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
        Raw::Millis(ms) => DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
    }
}

impl PixCharge {
    pub fn into_payment(self) -> Payment {
        Payment {
            payment_id: self.payment_id,
            order_id: self.order_id,
            amount: self.amount,
            pix: self.pix,
            expires_at: self.expires_at,
            status: PaymentStatus::Pending,
        }
    }
}

/// A webhook notification announcing a payment outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationEvent {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub status: String,
    pub txid: String,
}

impl ConfirmationEvent {
    /// Builds the deterministic "paid" event used to simulate provider
    /// confirmation. Same inputs always yield the same event.
    pub fn simulated(payment_id: &PaymentId, order_id: &OrderId) -> Self {
        Self {
            payment_id: payment_id.clone(),
            order_id: order_id.clone(),
            status: PaymentStatus::Paid.as_str().to_string(),
            txid: format!("SIMULATED-{payment_id}"),
        }
    }
}
