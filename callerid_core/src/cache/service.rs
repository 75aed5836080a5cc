//! The contact cache service
//!
//! [`ContactCache`] owns every resolved entry and the registry of callbacks
//! waiting on in-flight dispatches. All shared state sits behind one mutex;
//! callbacks always run after the lock has been released so they may call
//! back into the cache.

use crate::CacheConfig;
use crate::cache::callbacks::{ContactInfoCallback, Notification, notify_all};
use crate::cache::entry::ResolvedEntry;
use crate::cache::registry::CallbackRegistry;
use crate::cache::token::{QueryToken, TokenIssuer};
use crate::cache::CacheStats;
use crate::dispatch::{
    DispatchProgress, Dispatcher, StageEmitter, StageSink, StageUpdate, not_found_entry,
};
use crate::error::{InternalError, ProviderError, Result};
use crate::number;
use crate::query::{CacheKey, RawQuery};
use futures::FutureExt;
use log::{debug, error, warn};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;

/// What the cache did with a stage result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Applied,
    /// The result belonged to an older dispatch and was dropped
    Stale,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, ResolvedEntry>,
    registry: CallbackRegistry,
    tokens: TokenIssuer,
    dispatches_started: u64,
    stages_applied: u64,
    stale_dropped: u64,
}

struct CacheInner {
    state: Mutex<CacheState>,
    dispatcher: Arc<dyn Dispatcher>,
    runtime: Handle,
    dispatch_timeout: Option<Duration>,
    idle: Notify,
}

/// Asynchronous contact-resolution cache
///
/// Cloning is cheap and every clone shares the same storage.
#[derive(Clone)]
pub struct ContactCache {
    inner: Arc<CacheInner>,
}

impl std::fmt::Debug for ContactCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactCache")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Whether a cached entry no longer describes the number being resolved
pub fn needs_force_query(query: &RawQuery, entry: &ResolvedEntry) -> bool {
    match entry.original_number.as_deref() {
        Some(original) => !number::same_number(original, &query.phone_number),
        None => true,
    }
}

impl ContactCache {
    /// Create a cache whose dispatches run on the current tokio runtime
    pub fn new(dispatcher: Arc<dyn Dispatcher>, config: &CacheConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| InternalError::NoRuntime)?;
        config.validate()?;
        Ok(Self::with_runtime(dispatcher, config, runtime))
    }

    /// Create a cache whose dispatches run on `runtime`
    pub fn with_runtime(
        dispatcher: Arc<dyn Dispatcher>,
        config: &CacheConfig,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState::default()),
                dispatcher,
                runtime,
                dispatch_timeout: config.dispatch_timeout(),
                idle: Notify::new(),
            }),
        }
    }

    /// Resolve `query`, reporting to `callback`
    ///
    /// Returns the entry already known for the key, if any. A usable cached
    /// entry is also handed to `callback` before this returns. A dispatch is
    /// started when nothing is known or the number changed; `callback` then
    /// hears about every stage of that dispatch.
    pub fn resolve(
        &self,
        query: RawQuery,
        callback: Arc<dyn ContactInfoCallback>,
    ) -> Option<ResolvedEntry> {
        let key = query.key.clone();
        let mut state = self.inner.lock();
        let existing = state.entries.get(&key).cloned();

        let changed = match (state.registry.number(&key), &existing) {
            (Some(in_flight), _) => !number::same_number(in_flight, &query.phone_number),
            (None, Some(entry)) => needs_force_query(&query, entry),
            (None, None) => true,
        };

        if !changed {
            let joined = state.registry.register(&key, Arc::clone(&callback));
            drop(state);

            let usable = existing.filter(|entry| !needs_force_query(&query, entry));
            match &usable {
                Some(entry) => {
                    debug!("Cache hit for {key} (joined in-flight dispatch: {joined})");
                    notify_all(&[callback], Notification::Info, &key, entry);
                }
                None => debug!("Joined in-flight dispatch for {key}"),
            }
            return usable;
        }

        let token = state.tokens.issue(&key);
        state
            .registry
            .begin(&key, token.version(), &query.phone_number, callback);
        state.dispatches_started += 1;
        drop(state);

        debug!(
            "Starting dispatch {token} for {}",
            number::log_safe(&query.phone_number)
        );
        self.spawn_dispatch(query, token);
        existing
    }

    /// Apply a stage result produced by the dispatch behind `token`
    pub fn on_stage_result(
        &self,
        token: &QueryToken,
        update: StageUpdate,
        is_final: bool,
    ) -> StageOutcome {
        self.inner.apply(token, update, is_final)
    }

    /// Forget every entry and listener and restart token numbering
    ///
    /// Dispatches still running are not interrupted. Their later stages are
    /// accepted only as the first write for a key that has no entry and no
    /// newer dispatch; they never reach listeners registered after the clear.
    pub fn clear_all(&self) {
        let mut state = self.inner.lock();
        state.entries.clear();
        state.registry.clear();
        state.tokens.reset();
        drop(state);
        debug!("Cleared contact cache");
        self.inner.idle.notify_waiters();
    }

    /// Current entry for `key`
    pub fn get(&self, key: &CacheKey) -> Option<ResolvedEntry> {
        self.inner.lock().entries.get(key).cloned()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock();
        CacheStats {
            entry_count: state.entries.len(),
            in_flight: state.registry.len(),
            dispatches_started: state.dispatches_started,
            stages_applied: state.stages_applied,
            stale_dropped: state.stale_dropped,
        }
    }

    /// Wait until no dispatch is in flight
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.lock().registry.len() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn spawn_dispatch(&self, query: RawQuery, token: QueryToken) {
        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(inner.run_dispatch(query, token));
    }
}

impl CacheInner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one dispatch, guaranteeing a final stage even if it hangs or panics
    async fn run_dispatch(self: Arc<Self>, query: RawQuery, token: QueryToken) {
        let progress = Arc::new(DispatchProgress::default());
        let sink: Arc<dyn StageSink> = Arc::clone(&self) as Arc<dyn StageSink>;
        let emitter = StageEmitter::new(token.clone(), sink, Arc::clone(&progress));

        let run = AssertUnwindSafe(self.dispatcher.dispatch(query.clone(), emitter)).catch_unwind();
        let result = match self.dispatch_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("{} ({token})", ProviderError::timeout("dispatcher", limit));
                    self.force_final(&query, &token, &progress);
                    return;
                }
            },
            None => run.await,
        };

        if progress.is_finished() {
            return;
        }
        match result {
            Ok(()) => warn!("Dispatch {token} ended without a final stage"),
            Err(_) => error!("{}", InternalError::dispatch_panicked(query.key.as_str())),
        }
        self.force_final(&query, &token, &progress);
    }

    fn force_final(&self, query: &RawQuery, token: &QueryToken, progress: &DispatchProgress) {
        if !progress.claim_final() {
            return;
        }
        let update = if progress.emitted_any() {
            StageUpdate::Complete
        } else {
            StageUpdate::Replace(not_found_entry(query))
        };
        self.apply(token, update, true);
    }

    fn is_current(state: &CacheState, token: &QueryToken) -> bool {
        let key = token.key();
        if token.epoch() != state.tokens.epoch() {
            // Issued before clear_all: a first write for an idle key, nothing more
            return !state.entries.contains_key(key) && state.registry.version(key).is_none();
        }
        match (state.entries.get(key), state.registry.version(key)) {
            (None, _) => true,
            (Some(_), Some(in_flight)) => token.version() == in_flight,
            (Some(entry), None) => token.version() >= entry.query_version,
        }
    }

    fn apply(&self, token: &QueryToken, update: StageUpdate, is_final: bool) -> StageOutcome {
        let key = token.key();
        let mut state = self.lock();

        if !Self::is_current(&state, token) {
            state.stale_dropped += 1;
            debug!("Dropping stale {} stage from {token}", update.name());
            return StageOutcome::Stale;
        }

        let notification = match update {
            StageUpdate::Replace(mut next) => {
                next.query_version = token.version();
                next.has_pending_enrichment = !is_final;
                let merged = match state.entries.get(key) {
                    Some(current) => current.replaced_by(next),
                    None => next,
                };
                state.entries.insert(key.clone(), merged);
                Some(Notification::Info)
            }
            StageUpdate::Overlay(overlay) => {
                let entry = state.entries.entry(key.clone()).or_default();
                entry.overlay(overlay);
                entry.query_version = token.version();
                entry.has_pending_enrichment = !is_final;
                Some(Notification::Info)
            }
            StageUpdate::Photo(bytes) => match state.entries.get_mut(key) {
                Some(entry) => {
                    entry.set_photo(bytes);
                    entry.query_version = token.version();
                    entry.has_pending_enrichment = !is_final;
                    Some(Notification::ImageLoaded)
                }
                None => None,
            },
            StageUpdate::Complete => {
                if let Some(entry) = state.entries.get_mut(key) {
                    entry.query_version = token.version();
                    entry.has_pending_enrichment = false;
                }
                None
            }
        };
        state.stages_applied += 1;

        let in_flight = state.registry.version(key);
        let released = is_final
            && token.epoch() == state.tokens.epoch()
            && in_flight == Some(token.version());
        let callbacks = if released {
            state.registry.release(key)
        } else if notification.is_some() {
            state.registry.snapshot(key)
        } else {
            Vec::new()
        };
        let entry = state.entries.get(key).cloned();
        let idle = state.registry.len() == 0;
        drop(state);

        if let (Some(kind), Some(entry)) = (notification, entry) {
            debug!(
                "Applied stage from {token} (final: {is_final}), notifying {} callback(s)",
                callbacks.len()
            );
            notify_all(&callbacks, kind, key, &entry);
        }
        if released && idle {
            self.idle.notify_waiters();
        }
        StageOutcome::Applied
    }
}

impl StageSink for CacheInner {
    fn on_stage_result(
        &self,
        token: &QueryToken,
        update: StageUpdate,
        is_final: bool,
    ) -> StageOutcome {
        self.apply(token, update, is_final)
    }
}
