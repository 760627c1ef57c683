use pixcart::application::cart_store::CartStore;
use pixcart::domain::cart::{CartSnapshot, ProductRef};
use pixcart::infrastructure::in_memory::InMemoryMarketplace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

fn recomputed(snapshot: &CartSnapshot) -> Decimal {
    snapshot
        .items
        .iter()
        .map(|i| i.unit_price.value() * Decimal::from(i.quantity.get()))
        .sum()
}

/// Random add/remove/clear sequences keep the total equal to the sum of
/// the merged lines at every step.
#[tokio::test]
async fn test_total_matches_lines_for_random_sequences() {
    let prices = [("p1", dec!(10.00)), ("p2", dec!(5.00)), ("p3", dec!(42.50)), ("p4", dec!(0.99))];
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..20 {
        let store = CartStore::new(Arc::new(InMemoryMarketplace::with_catalog(prices)));
        let mut expected: HashMap<&str, u32> = HashMap::new();

        for _ in 0..50 {
            let (id, _) = prices[rng.gen_range(0..prices.len())];
            let snapshot = match rng.gen_range(0..10) {
                0 => {
                    expected.clear();
                    store.clear().await.unwrap()
                }
                1..=2 => {
                    expected.remove(id);
                    store.remove(&ProductRef::new(id)).await.unwrap()
                }
                _ => {
                    let qty = rng.gen_range(1..=5);
                    *expected.entry(id).or_default() += qty;
                    store.add(&ProductRef::new(id), Some(qty)).await.unwrap()
                }
            };

            assert_eq!(snapshot.total.value(), recomputed(&snapshot));
            assert_eq!(snapshot.items.len(), expected.len());
            for item in &snapshot.items {
                assert_eq!(item.quantity.get(), expected[item.product_ref.as_str()]);
            }
            assert_eq!(store.snapshot().await, snapshot);
        }
    }
}
