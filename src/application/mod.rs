//! Application layer: the cart → checkout → payment lifecycle.
//!
//! Each component owns one piece of the flow and talks to the backend
//! through the ports in `domain::ports`. `CheckoutCoordinator` ties them to
//! a single buyer session.

pub mod cart_store;
pub mod checkout;
pub mod coordinator;
pub mod in_flight;
pub mod order_history;
pub mod payment_session;
pub mod reconciler;
