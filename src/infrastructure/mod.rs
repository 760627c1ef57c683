//! Port adapters: the in-memory marketplace and the REST client.

pub mod http;
pub mod in_memory;
