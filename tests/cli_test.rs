use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn pixcart() -> Command {
    let mut cmd = Command::new(cargo_bin!());
    cmd.env_remove("PIXCART_API_URL")
        .env_remove("PIXCART_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_purchase_with_simulated_payment() {
    let mut cmd = pixcart();
    cmd.args(["purchase", "p1:2", "p2", "--simulate-payment"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("cart_total: 25.00"))
        .stdout(predicate::str::contains("order: ord_1"))
        .stdout(predicate::str::contains("amount: 25.00"))
        .stdout(predicate::str::contains("pix_copy_paste: "))
        .stdout(predicate::str::contains("payment_status: paid"));
}

#[test]
fn test_purchase_without_confirmation_stays_pending() {
    let mut cmd = pixcart();
    cmd.args(["purchase", "p3"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("amount: 42.50"))
        .stdout(predicate::str::contains("payment_status: pending"));
}

#[test]
fn test_in_memory_fallback_warning() {
    let mut cmd = pixcart();
    cmd.arg("cart");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING: No --api-url given"))
        .stdout(predicate::str::contains("cart_total: 0.00"));
}

#[test]
fn test_zero_quantity_fails() {
    let mut cmd = pixcart();
    cmd.args(["purchase", "p1:0"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Quantity must be at least 1"));
}

#[test]
fn test_unknown_product_fails() {
    let mut cmd = pixcart();
    cmd.args(["purchase", "nope"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("product nope not found"));
}

#[test]
fn test_orders_empty_in_fresh_session() {
    let mut cmd = pixcart();
    cmd.args(["orders", "--status", "paid"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("orders: none"));
}
