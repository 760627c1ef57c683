use pixcart::domain::cart::{ProductRef, Quantity};
use pixcart::domain::ports::{CartServiceRef, CheckoutServiceRef, PaymentServiceRef};
use pixcart::infrastructure::in_memory::InMemoryMarketplace;
use std::sync::Arc;

#[tokio::test]
async fn test_ports_as_shared_trait_objects() {
    let backend = Arc::new(InMemoryMarketplace::with_demo_catalog());
    let cart: CartServiceRef = backend.clone();
    let checkout: CheckoutServiceRef = backend.clone();
    let payments: PaymentServiceRef = backend;

    // Verify Send + Sync by spawning tasks
    let order_id = tokio::spawn(async move {
        cart.add(&ProductRef::new("p2"), Quantity::new(2).unwrap())
            .await
            .unwrap();
        checkout.checkout().await.unwrap().id
    })
    .await
    .unwrap();

    let charge = tokio::spawn(async move { payments.create_pix(&order_id).await.unwrap() })
        .await
        .unwrap();

    assert_eq!(charge.order_id.as_str(), "ord_1");
    assert_eq!(charge.amount.to_string(), "10.00");
}
