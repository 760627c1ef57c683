//! Domain layer: value objects, entities and the ports to remote services.

pub mod cart;
pub mod order;
pub mod payment;
pub mod ports;
pub mod session;
