use crate::error::{CheckoutError, Result};
use dashmap::DashSet;
use std::sync::Arc;
use tracing::warn;

/// Registry of keyed operations currently awaiting a remote response.
///
/// Used to reject a duplicate submission (a second checkout, a second
/// charge for the same order) instead of sending it.
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    keys: Arc<DashSet<String>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key`, failing with `InvalidStateError` if it is already held.
    ///
    /// The claim is released when the returned token is dropped, which also
    /// covers errors and a caller dropping the future mid-request.
    pub fn acquire(&self, key: impl Into<String>) -> Result<InFlightToken> {
        let key = key.into();
        if !self.keys.insert(key.clone()) {
            warn!(key = %key, "rejected duplicate submission");
            return Err(CheckoutError::InvalidStateError(format!(
                "operation '{key}' is already in flight"
            )));
        }
        Ok(InFlightToken {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

#[derive(Debug)]
pub struct InFlightToken {
    keys: Arc<DashSet<String>>,
    key: String,
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.keys.remove(&self.key);
    }
}
