//! Query dispatch: the multi-stage pipeline behind one cache miss
//!
//! This module provides:
//! - [`Dispatcher`], the seam between the cache and the lookup pipeline
//! - [`QueryDispatcher`], the pipeline over the identity providers
//! - Typed stage results and the emitter that stamps them with a token
//! - First-match fan-out across secondary directories

pub mod dispatcher;
pub mod entries;
pub mod fanout;
pub mod stage;

pub use dispatcher::{DispatcherBuilder, QueryDispatcher};
pub use entries::not_found_entry;
pub use fanout::first_match;
pub use stage::{DispatchProgress, DispatchState, StageEmitter, StageSink, StageUpdate};

use crate::query::RawQuery;
use async_trait::async_trait;

/// Executes one dispatch for a query
///
/// Implementations report through `emitter` and must eventually emit exactly
/// one final stage. The cache supplies a final stage on their behalf if a
/// dispatch returns, panics or times out without one.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, query: RawQuery, emitter: StageEmitter);
}
