use crate::domain::cart::{Cart, CartItem, CartSnapshot, Price, ProductRef, Quantity};
use crate::domain::ports::{CartServiceRef, RemoteCart};
use crate::error::{CheckoutError, Result};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Local mirror of the buyer's cart.
///
/// Every mutation goes to the cart service first. The mirror only changes
/// after the service accepts it, so a failed call leaves it untouched.
pub struct CartStore {
    service: CartServiceRef,
    cart: RwLock<Cart>,
}

impl CartStore {
    pub fn new(service: CartServiceRef) -> Self {
        Self {
            service,
            cart: RwLock::new(Cart::new()),
        }
    }

    /// Adds `quantity` (default 1) of a product, merging with an existing line.
    pub async fn add(&self, product_ref: &ProductRef, quantity: Option<u32>) -> Result<CartSnapshot> {
        let quantity = match quantity {
            Some(qty) => Quantity::new(qty)?,
            None => Quantity::default(),
        };

        let remote = self.service.add(product_ref, quantity).await?;
        let line = remote.line(product_ref).ok_or_else(|| {
            CheckoutError::remote(format!(
                "cart service response has no line for product {product_ref}"
            ))
        })?;

        let mut cart = self.cart.write().await;
        cart.add(CartItem::new(product_ref.clone(), quantity, line.unit_price));
        debug!(product = %product_ref, qty = quantity.get(), total = %cart.total(), "added to cart");
        Self::check_divergence(&cart, &remote);
        Ok(cart.snapshot())
    }

    /// Removes a product's line. Removing an absent product is not an error.
    pub async fn remove(&self, product_ref: &ProductRef) -> Result<CartSnapshot> {
        let remote = self.service.remove(product_ref).await?;

        let mut cart = self.cart.write().await;
        cart.remove(product_ref);
        debug!(product = %product_ref, total = %cart.total(), "removed from cart");
        Self::check_divergence(&cart, &remote);
        Ok(cart.snapshot())
    }

    pub async fn clear(&self) -> Result<CartSnapshot> {
        self.service.clear().await?;

        let mut cart = self.cart.write().await;
        cart.clear();
        debug!("cart cleared");
        Ok(cart.snapshot())
    }

    /// Replaces the mirror with the cart service's current contents.
    pub async fn reload(&self) -> Result<CartSnapshot> {
        let remote = self.service.fetch().await?;

        let mut cart = self.cart.write().await;
        *cart = Cart::from_items(remote.items);
        debug!(lines = cart.items().len(), total = %cart.total(), "cart reloaded");
        Ok(cart.snapshot())
    }

    /// Empties the local mirror without contacting the cart service.
    pub(crate) async fn discard_local(&self) {
        self.cart.write().await.clear();
    }

    pub async fn snapshot(&self) -> CartSnapshot {
        self.cart.read().await.snapshot()
    }

    fn check_divergence(cart: &Cart, remote: &RemoteCart) {
        let remote_total: Price = remote.items.iter().map(CartItem::line_total).sum();
        if remote_total != cart.total() {
            warn!(
                local = %cart.total(),
                remote = %remote_total,
                "local cart diverged from cart service; reload to resync"
            );
        }
    }
}
