use crate::domain::cart::CartSnapshot;
use crate::domain::order::{Order, OrderSummary};
use crate::domain::payment::{Payment, PaymentStatus};
use std::io::{self, Write};

/// Writes flow results as `key: value` lines.
///
/// Wraps any `Write` sink (usually a locked stdout) so output stays easy to
/// grep and diff.
pub struct ReportWriter<W: Write> {
    out: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_cart(&mut self, cart: &CartSnapshot) -> io::Result<()> {
        for item in &cart.items {
            writeln!(
                self.out,
                "item: {} x{} @ {} = {}",
                item.product_ref,
                item.quantity.get(),
                item.unit_price,
                item.line_total()
            )?;
        }
        writeln!(self.out, "cart_total: {}", cart.total)
    }

    pub fn write_order(&mut self, order: &Order) -> io::Result<()> {
        writeln!(self.out, "order: {}", order.id())?;
        writeln!(self.out, "order_status: {}", order.status())?;
        writeln!(self.out, "order_total: {}", order.total())
    }

    pub fn write_payment(&mut self, payment: &Payment) -> io::Result<()> {
        writeln!(self.out, "payment: {}", payment.payment_id)?;
        writeln!(self.out, "amount: {}", payment.amount)?;
        writeln!(self.out, "pix_copy_paste: {}", payment.pix.copy_paste)?;
        writeln!(self.out, "pix_qr: {}", payment.pix.qr_code)?;
        writeln!(self.out, "expires_at: {}", payment.expires_at.to_rfc3339())
    }

    pub fn write_status(&mut self, status: PaymentStatus) -> io::Result<()> {
        writeln!(self.out, "payment_status: {status}")
    }

    pub fn write_orders(&mut self, orders: &[OrderSummary]) -> io::Result<()> {
        if orders.is_empty() {
            return writeln!(self.out, "orders: none");
        }
        for order in orders {
            let created = order
                .created_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                self.out,
                "order: #{} {} {} {}",
                order.short_id(),
                order.status,
                order.total,
                created
            )?;
            for line in &order.items {
                writeln!(
                    self.out,
                    "  {} x{} = {}",
                    line.title.as_deref().unwrap_or(&line.product_ref),
                    line.quantity,
                    line.line_total()
                )?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
