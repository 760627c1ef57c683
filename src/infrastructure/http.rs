//! REST client for the storefront backend.
//!
//! Implements every port over the `/api/v1` JSON API with bearer-token
//! authentication. Non-2xx responses become `RemoteError` carrying the HTTP
//! status and the backend's `message` when it sends one.

use crate::domain::cart::{CartItem, Price, ProductRef, Quantity};
use crate::domain::order::{OrderId, OrderLine, OrderStatus, OrderSummary};
use crate::domain::payment::{ConfirmationEvent, PixCharge};
use crate::domain::ports::{
    CartService, CheckoutService, CreatedOrder, OrderService, PaymentService, RemoteCart,
};
use crate::domain::session::SessionContext;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpMarketplace {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpMarketplace {
    /// Builds a client authenticated as `session`.
    pub fn new(config: HttpConfig, session: &SessionContext) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            CheckoutError::ValidationError(format!("invalid API URL '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CheckoutError::ValidationError(format!(
                "invalid API URL '{}': not a base URL",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(bearer) = session.bearer() {
            let mut value = HeaderValue::from_str(&bearer).map_err(|e| {
                CheckoutError::ValidationError(format!("invalid session token: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutError::remote(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
        })
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        self.client.request(method, url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let value = self.send_raw(request).await?;
        serde_json::from_value(value)
            .map_err(|e| CheckoutError::remote(format!("failed to parse response: {e}")))
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = %status, url = %response.url(), "response received");

        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| CheckoutError::remote(format!("failed to parse response: {e}")))?;
        Ok(unwrap_data(value))
    }

    async fn send_cart(&self, request: RequestBuilder) -> Result<RemoteCart> {
        let wire: WireCart = self.send(request).await?;
        wire.try_into()
    }
}

async fn error_from_response(response: Response) -> CheckoutError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<WireError>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            }
        });
    warn!(status = %status, message = %message, "backend returned an error");
    CheckoutError::remote_status(status.as_u16(), message)
}

/// Strips a top-level `{"data": ...}` envelope if present.
fn unwrap_data(value: Value) -> Value {
    unwrap_key(value, "data")
}

/// Picks `value[key]` when present and non-null, else `value` itself.
fn unwrap_key(mut value: Value, key: &str) -> Value {
    if let Some(inner) = value.get_mut(key).filter(|v| !v.is_null()) {
        return inner.take();
    }
    value
}

#[derive(Deserialize)]
struct WireError {
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireProductRef {
    Id(String),
    Populated {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        title: Option<String>,
        price: Option<Decimal>,
    },
}

impl WireProductRef {
    fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Populated { id, .. } => id,
        }
    }

    fn title(&self) -> Option<String> {
        match self {
            Self::Id(_) => None,
            Self::Populated { title, .. } => title.clone(),
        }
    }

    fn price(&self) -> Option<Decimal> {
        match self {
            Self::Id(_) => None,
            Self::Populated { price, .. } => *price,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCartLine {
    product_id: WireProductRef,
    qty: u32,
    unit_price: Option<Decimal>,
}

#[derive(Deserialize)]
struct WireCart {
    #[serde(default)]
    items: Vec<WireCartLine>,
    total: Option<Decimal>,
}

impl TryFrom<WireCart> for RemoteCart {
    type Error = CheckoutError;

    fn try_from(wire: WireCart) -> Result<Self> {
        let items = wire
            .items
            .into_iter()
            .map(|line| {
                let unit = line
                    .unit_price
                    .or_else(|| line.product_id.price())
                    .ok_or_else(|| {
                        CheckoutError::remote(format!(
                            "cart line for product {} has no unit price",
                            line.product_id.id()
                        ))
                    })?;
                let quantity = Quantity::new(line.qty)
                    .map_err(|e| CheckoutError::remote(format!("invalid cart line: {e}")))?;
                let unit_price = Price::new(unit)
                    .map_err(|e| CheckoutError::remote(format!("invalid cart line: {e}")))?;
                Ok(CartItem::new(
                    ProductRef::new(line.product_id.id()),
                    quantity,
                    unit_price,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RemoteCart {
            items,
            total: wire.total,
        })
    }
}

#[derive(Deserialize)]
struct WireCreatedOrder {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    #[serde(default)]
    status: Option<OrderStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOrderLine {
    product_id: WireProductRef,
    title: Option<String>,
    qty: u32,
    unit_price: Price,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOrder {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    #[serde(default)]
    status: OrderStatus,
    total: Price,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    items: Vec<WireOrderLine>,
}

impl From<WireOrder> for OrderSummary {
    fn from(wire: WireOrder) -> Self {
        Self {
            id: OrderId::new(wire.id),
            status: wire.status,
            total: wire.total,
            created_at: wire.created_at,
            items: wire
                .items
                .into_iter()
                .map(|line| OrderLine {
                    product_ref: line.product_id.id().to_string(),
                    title: line.title.or_else(|| line.product_id.title()),
                    quantity: line.qty,
                    unit_price: line.unit_price,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct WireStatus {
    status: Option<String>,
}

#[async_trait]
impl CartService for HttpMarketplace {
    async fn fetch(&self) -> Result<RemoteCart> {
        self.send_cart(self.request(Method::GET, &["cart"])).await
    }

    async fn add(&self, product_ref: &ProductRef, quantity: Quantity) -> Result<RemoteCart> {
        let body = json!({ "productId": product_ref, "qty": quantity.get() });
        self.send_cart(self.request(Method::POST, &["cart"]).json(&body))
            .await
    }

    async fn remove(&self, product_ref: &ProductRef) -> Result<RemoteCart> {
        let request = self.request(Method::DELETE, &["cart", "items", product_ref.as_str()]);
        self.send_cart(request).await
    }

    async fn clear(&self) -> Result<RemoteCart> {
        self.send_cart(self.request(Method::DELETE, &["cart"])).await
    }
}

#[async_trait]
impl CheckoutService for HttpMarketplace {
    async fn checkout(&self) -> Result<CreatedOrder> {
        let value = self
            .send_raw(self.request(Method::POST, &["orders", "checkout"]))
            .await?;
        let wire: WireCreatedOrder = serde_json::from_value(unwrap_key(value, "order"))
            .map_err(|e| CheckoutError::remote(format!("checkout response has no order: {e}")))?;
        Ok(CreatedOrder {
            id: OrderId::new(wire.id),
            status: wire.status.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl PaymentService for HttpMarketplace {
    async fn create_pix(&self, order_id: &OrderId) -> Result<PixCharge> {
        let body = json!({ "orderId": order_id });
        self.send(self.request(Method::POST, &["payments", "create-pix"]).json(&body))
            .await
    }

    async fn status(&self, order_id: &OrderId) -> Result<String> {
        let request = self.request(Method::GET, &["payments", order_id.as_str(), "status"]);
        let wire: WireStatus = self.send(request).await?;
        Ok(wire.status.unwrap_or_default())
    }

    async fn webhook(&self, event: &ConfirmationEvent) -> Result<()> {
        self.send_raw(self.request(Method::POST, &["payments", "webhook"]).json(event))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl OrderService for HttpMarketplace {
    async fn list(&self) -> Result<Vec<OrderSummary>> {
        let value = self.send_raw(self.request(Method::GET, &["orders"])).await?;
        let wire: Vec<WireOrder> = serde_json::from_value(unwrap_key(value, "orders"))
            .map_err(|e| CheckoutError::remote(format!("failed to parse orders: {e}")))?;
        Ok(wire.into_iter().map(OrderSummary::from).collect())
    }
}
