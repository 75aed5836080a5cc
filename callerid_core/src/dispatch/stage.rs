//! Stage results and the per-dispatch emitter that carries them to the cache

use crate::cache::{QueryToken, ResolvedEntry, StageOutcome};
use bytes::Bytes;
use log::{debug, trace};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Partial result of one dispatch stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageUpdate {
    /// First-pass result; replaces the stored entry wholesale
    Replace(ResolvedEntry),
    /// Enrichment; overlays non-empty fields onto the stored entry
    Overlay(ResolvedEntry),
    /// Photo bytes for the stored entry
    Photo(Bytes),
    /// Nothing changed, the stage only carries finality
    Complete,
}

impl StageUpdate {
    pub fn name(&self) -> &'static str {
        match self {
            StageUpdate::Replace(_) => "replace",
            StageUpdate::Overlay(_) => "overlay",
            StageUpdate::Photo(_) => "photo",
            StageUpdate::Complete => "complete",
        }
    }
}

/// Progress of a single dispatch; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DispatchState {
    New,
    LocalLookup,
    DirectoryFanout,
    NetworkEnrichment,
    PhotoFetch,
    Done,
}

/// Receiver of stage results, implemented by the contact cache
pub trait StageSink: Send + Sync {
    fn on_stage_result(&self, token: &QueryToken, update: StageUpdate, is_final: bool)
    -> StageOutcome;
}

/// Flags shared between an emitter and whoever supervises its dispatch
#[derive(Debug, Default)]
pub struct DispatchProgress {
    emitted_any: AtomicBool,
    finished: AtomicBool,
}

impl DispatchProgress {
    pub fn emitted_any(&self) -> bool {
        self.emitted_any.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Claim the right to emit the final stage; only the first caller wins
    pub(crate) fn claim_final(&self) -> bool {
        !self.finished.swap(true, Ordering::AcqRel)
    }
}

/// Handle a dispatcher uses to report stages for one token
///
/// Every stage is stamped with the same token. Once a final stage has been
/// emitted, further stages are ignored.
pub struct StageEmitter {
    token: QueryToken,
    sink: Arc<dyn StageSink>,
    progress: Arc<DispatchProgress>,
    state: DispatchState,
}

impl StageEmitter {
    pub fn new(token: QueryToken, sink: Arc<dyn StageSink>, progress: Arc<DispatchProgress>) -> Self {
        Self {
            token,
            sink,
            progress,
            state: DispatchState::New,
        }
    }

    pub fn token(&self) -> &QueryToken {
        &self.token
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.progress.is_finished()
    }

    /// Move the dispatch to `next`; returns false if that would go backwards
    pub fn advance(&mut self, next: DispatchState) -> bool {
        if next <= self.state {
            debug!(
                "Dispatch {} refused transition {:?} -> {:?}",
                self.token, self.state, next
            );
            return false;
        }
        trace!("Dispatch {}: {:?} -> {:?}", self.token, self.state, next);
        self.state = next;
        true
    }

    /// Report a stage result to the cache
    pub fn emit(&mut self, update: StageUpdate, is_final: bool) -> StageOutcome {
        if self.progress.is_finished() {
            debug!(
                "Dispatch {} already finished, ignoring {} stage",
                self.token,
                update.name()
            );
            return StageOutcome::Stale;
        }

        if is_final {
            if !self.progress.claim_final() {
                return StageOutcome::Stale;
            }
            self.advance(DispatchState::Done);
        }
        self.progress.emitted_any.store(true, Ordering::Release);
        self.sink.on_stage_result(&self.token, update, is_final)
    }

    /// Emit a final stage that changes nothing
    pub fn finish(&mut self) -> StageOutcome {
        self.emit(StageUpdate::Complete, true)
    }
}
