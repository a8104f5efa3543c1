//! Busy Set: identities with an execution in flight.

use super::entities::Address;
use std::collections::HashSet;

/// Set of identities currently bound to an execution.
///
/// Insertion is refused for an identity that is already present, which is
/// what keeps submissions serialized per identity.
#[derive(Debug, Default)]
pub struct BusySet {
    inner: HashSet<Address>,
}

impl BusySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an identity busy. Returns `false` if it already was.
    pub fn try_insert(&mut self, address: Address) -> bool {
        self.inner.insert(address)
    }

    /// Free an identity. Returns `false` if it was not busy.
    pub fn remove(&mut self, address: &Address) -> bool {
        self.inner.remove(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.inner.contains(address)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
