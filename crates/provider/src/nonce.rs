//! Nonce reservations shared between adapter instances.
//!
//! The tracker is passed explicitly as an `Arc` to every adapter that should
//! share it, rather than living as process-wide state; callers decide the
//! sharing scope.

use alloy_primitives::Address;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Hands out monotonically increasing nonces per address, floored by the
/// network-observed transaction count.
#[derive(Debug, Default)]
pub struct NonceTracker {
    reserved: Mutex<HashMap<Address, u64>>,
}

impl NonceTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reserve the next nonce for `address`.
    ///
    /// Returns the network count on first use, and afterwards whichever is
    /// higher: the network count or one past the last reservation. Interleaved
    /// signing requests therefore never reuse a nonce even while earlier
    /// transactions are still pending.
    pub fn reserve(&self, address: Address, network_count: u64) -> u64 {
        let mut reserved = self.reserved.lock().expect("nonce tracker lock poisoned");
        let next = match reserved.get(&address) {
            Some(last) => (last + 1).max(network_count),
            None => network_count,
        };
        reserved.insert(address, next);
        next
    }

    /// Drop the reservation state for `address`, e.g. after a rejected
    /// signing workflow left a gap.
    pub fn release(&self, address: Address) {
        self.reserved
            .lock()
            .expect("nonce tracker lock poisoned")
            .remove(&address);
    }
}
