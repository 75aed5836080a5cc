//! Bookkeeping for in-flight dispatches and the callbacks waiting on them

use crate::cache::callbacks::ContactInfoCallback;
use crate::query::CacheKey;
use std::collections::HashMap;
use std::sync::Arc;

/// Callbacks waiting on one key, each registered at most once
#[derive(Default, Clone)]
pub struct PendingCallbackSet {
    callbacks: Vec<Arc<dyn ContactInfoCallback>>,
}

impl PendingCallbackSet {
    /// Add `callback` unless the same instance is already present
    pub fn insert(&mut self, callback: Arc<dyn ContactInfoCallback>) -> bool {
        if self.contains(&callback) {
            return false;
        }
        self.callbacks.push(callback);
        true
    }

    pub fn contains(&self, callback: &Arc<dyn ContactInfoCallback>) -> bool {
        self.callbacks.iter().any(|c| same_callback(c, callback))
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Arc<dyn ContactInfoCallback>> {
        self.callbacks.clone()
    }
}

impl std::fmt::Debug for PendingCallbackSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCallbackSet")
            .field("len", &self.callbacks.len())
            .finish()
    }
}

// Compare data pointers only; vtable pointers for one type may differ across
// codegen units.
fn same_callback(a: &Arc<dyn ContactInfoCallback>, b: &Arc<dyn ContactInfoCallback>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[derive(Debug)]
struct InFlight {
    version: u64,
    number: String,
    callbacks: PendingCallbackSet,
}

/// Per-key record of the live dispatch and its listeners
#[derive(Debug, Default)]
pub(crate) struct CallbackRegistry {
    in_flight: HashMap<CacheKey, InFlight>,
}

impl CallbackRegistry {
    /// Mark a dispatch with `version` as the live one for `key`
    ///
    /// Listeners already waiting on the key carry over to the new dispatch.
    pub(crate) fn begin(
        &mut self,
        key: &CacheKey,
        version: u64,
        number: &str,
        callback: Arc<dyn ContactInfoCallback>,
    ) {
        let slot = self.in_flight.entry(key.clone()).or_insert_with(|| InFlight {
            version,
            number: String::new(),
            callbacks: PendingCallbackSet::default(),
        });
        slot.version = version;
        slot.number = number.to_string();
        slot.callbacks.insert(callback);
    }

    /// Add a listener to the live dispatch for `key`; false if none is live
    pub(crate) fn register(
        &mut self,
        key: &CacheKey,
        callback: Arc<dyn ContactInfoCallback>,
    ) -> bool {
        match self.in_flight.get_mut(key) {
            Some(slot) => {
                slot.callbacks.insert(callback);
                true
            }
            None => false,
        }
    }

    pub(crate) fn version(&self, key: &CacheKey) -> Option<u64> {
        self.in_flight.get(key).map(|slot| slot.version)
    }

    /// Number the live dispatch for `key` is resolving
    pub(crate) fn number(&self, key: &CacheKey) -> Option<&str> {
        self.in_flight.get(key).map(|slot| slot.number.as_str())
    }

    pub(crate) fn snapshot(&self, key: &CacheKey) -> Vec<Arc<dyn ContactInfoCallback>> {
        self.in_flight
            .get(key)
            .map(|slot| slot.callbacks.to_vec())
            .unwrap_or_default()
    }

    /// Drop the record for `key`, returning its listeners
    pub(crate) fn release(&mut self, key: &CacheKey) -> Vec<Arc<dyn ContactInfoCallback>> {
        self.in_flight
            .remove(key)
            .map(|slot| slot.callbacks.to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn clear(&mut self) {
        self.in_flight.clear();
    }
}
