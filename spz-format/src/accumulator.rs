//! Thread-safe point accumulation
//!
//! Producers push decoded batches from any thread. The terminal outcome
//! (success or failure) is delivered exactly once; consumers block in
//! [`PointAccumulator::wait`] or poll [`PointAccumulator::try_take`].

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::formats::container::UnpackedPoint;

#[derive(Debug, Default)]
struct State {
    points: Vec<UnpackedPoint>,
    /// Set once by the first `finish` call
    outcome: Option<Result<()>>,
}

/// Lock-protected point buffer with an exactly-once terminal signal
///
/// Batches pushed after the terminal signal, and any `finish` after the
/// first, are ignored.
#[derive(Debug, Default)]
pub struct PointAccumulator {
    state: Mutex<State>,
    finished: Condvar,
}

impl PointAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                points: Vec::with_capacity(capacity),
                outcome: None,
            }),
            finished: Condvar::new(),
        }
    }

    /// Lock, recovering the state if a producer panicked while holding it
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a batch; returns false if the accumulator already finished
    pub fn push_batch(&self, batch: impl IntoIterator<Item = UnpackedPoint>) -> bool {
        let mut state = self.lock();
        if state.outcome.is_some() {
            debug!("Dropping point batch pushed after the terminal signal");
            return false;
        }
        state.points.extend(batch);
        true
    }

    /// Deliver the terminal outcome
    ///
    /// Returns true for the call that actually finished the accumulator.
    pub fn finish(&self, outcome: Result<()>) -> bool {
        let mut state = self.lock();
        if state.outcome.is_some() {
            debug!("Ignoring duplicate terminal signal: {outcome:?}");
            return false;
        }
        state.outcome = Some(outcome);
        drop(state);
        self.finished.notify_all();
        true
    }

    pub fn is_finished(&self) -> bool {
        self.lock().outcome.is_some()
    }

    /// Points currently buffered
    pub fn len(&self) -> usize {
        self.lock().points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until finished, then take the points or the failure
    ///
    /// Points are handed out once; later successful takes return an empty
    /// vector.
    pub fn wait(&self) -> Result<Vec<UnpackedPoint>> {
        let mut state = self
            .finished
            .wait_while(self.lock(), |state| state.outcome.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        Self::take(&mut state)
    }

    /// Non-blocking [`wait`](Self::wait); `None` until finished
    pub fn try_take(&self) -> Option<Result<Vec<UnpackedPoint>>> {
        let mut state = self.lock();
        if state.outcome.is_none() {
            return None;
        }
        Some(Self::take(&mut state))
    }

    fn take(state: &mut State) -> Result<Vec<UnpackedPoint>> {
        match &state.outcome {
            Some(Err(err)) => Err(err.clone()),
            _ => Ok(std::mem::take(&mut state.points)),
        }
    }
}
