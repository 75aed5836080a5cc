//! Query tokens used to recognize stale stage results

use crate::query::CacheKey;
use std::fmt;

/// Immutable `(key, epoch, version)` stamp carried by every result of one dispatch
///
/// Versions come from a single counter shared by all keys, so within one
/// epoch a later dispatch always carries a strictly greater version than an
/// earlier one. `clear_all` restarts the counter and opens a new epoch, which
/// keeps tokens issued before the clear distinguishable from new ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryToken {
    key: CacheKey,
    epoch: u64,
    version: u64,
}

impl QueryToken {
    /// Create a token in the first epoch
    pub fn new(key: CacheKey, version: u64) -> Self {
        Self {
            key,
            epoch: 0,
            version,
        }
    }

    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.key, self.version)?;
        if self.epoch > 0 {
            write!(f, "@{}", self.epoch)?;
        }
        Ok(())
    }
}

/// Issues query tokens from a monotonically increasing counter
#[derive(Debug, Default)]
pub(crate) struct TokenIssuer {
    epoch: u64,
    last: u64,
}

impl TokenIssuer {
    pub(crate) fn issue(&mut self, key: &CacheKey) -> QueryToken {
        self.last += 1;
        QueryToken::new(key.clone(), self.last).with_epoch(self.epoch)
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Restart version numbering in a fresh epoch
    pub(crate) fn reset(&mut self) {
        self.epoch += 1;
        self.last = 0;
    }
}
