use super::cart::{CartItem, CartSnapshot, Price};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Order status as mirrored from the backend.
///
/// Transitions happen on the backend only; the client never advances this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Maps a backend status string, accepting the Portuguese labels the
    /// storefront API uses. Unrecognized values fall back to `Pending`.
    pub fn from_remote(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "paid" | "pago" => Self::Paid,
            "in_transit" | "em_transito" => Self::InTransit,
            "delivered" | "entregue" => Self::Delivered,
            "cancelled" | "canceled" | "cancelado" => Self::Cancelled,
            "pending" | "pendente" => Self::Pending,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_remote(&raw))
    }
}

/// Strict parse used for user input such as CLI filters.
impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" | "pendente" => Ok(Self::Pending),
            "paid" | "pago" => Ok(Self::Paid),
            "in_transit" | "em_transito" => Ok(Self::InTransit),
            "delivered" | "entregue" => Ok(Self::Delivered),
            "cancelled" | "cancelado" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

/// An order created at checkout.
///
/// Items and total are a snapshot of the cart at checkout time. Fields are
/// private so later cart mutations cannot reach into a past order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    items: Vec<CartItem>,
    total: Price,
    status: OrderStatus,
}

impl Order {
    pub fn from_snapshot(id: OrderId, snapshot: CartSnapshot, status: OrderStatus) -> Self {
        Self {
            id,
            items: snapshot.items,
            total: snapshot.total,
            status,
        }
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total(&self) -> Price {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_ref: String,
    pub title: Option<String>,
    pub quantity: u32,
    pub unit_price: Price,
}

impl OrderLine {
    pub fn line_total(&self) -> Price {
        self.unit_price * self.quantity
    }
}

/// Read-only projection of a past order, as listed by the order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Price,
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderLine>,
}

impl OrderSummary {
    /// Last six characters of the id, as shown in order listings.
    pub fn short_id(&self) -> &str {
        let id = self.id.as_str();
        let start = id
            .char_indices()
            .rev()
            .nth(5)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &id[start..]
    }
}
