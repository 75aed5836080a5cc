//! Dispatcher driven by the test instead of by providers

use async_trait::async_trait;
use callerid_core::{Dispatcher, RawQuery, StageEmitter};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ManualState {
    started: usize,
    pending: Vec<(RawQuery, StageEmitter)>,
}

/// Dispatcher that parks every dispatch so the test can emit its stages
///
/// Parked dispatches never return on their own; the test takes their
/// emitters and reports stages in whatever order the scenario needs.
#[derive(Clone, Default)]
pub struct ManualDispatcher {
    state: Arc<Mutex<ManualState>>,
}

impl ManualDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dispatches started so far
    pub fn dispatch_count(&self) -> usize {
        self.state.lock().unwrap().started
    }

    /// Take every parked dispatch, oldest first
    pub fn take_all(&self) -> Vec<(RawQuery, StageEmitter)> {
        std::mem::take(&mut self.state.lock().unwrap().pending)
    }

    /// Wait until `count` dispatches are parked and take them
    pub async fn take(&self, count: usize) -> Vec<(RawQuery, StageEmitter)> {
        loop {
            {
                let mut state = self.state.lock().unwrap();
                if state.pending.len() >= count {
                    return state.pending.drain(..count).collect();
                }
            }
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Dispatcher for ManualDispatcher {
    async fn dispatch(&self, query: RawQuery, emitter: StageEmitter) {
        {
            let mut state = self.state.lock().unwrap();
            state.started += 1;
            state.pending.push((query, emitter));
        }
        std::future::pending::<()>().await;
    }
}
