//! Per-experiment recomputation locks
//!
//! Recomputing an experiment deletes its processed generation and writes a
//! new one; two recomputations of the same experiment must never
//! interleave. Each experiment gets its own mutex, created on first use, so
//! different experiments never wait on each other.

use dashmap::DashMap;
use exprvec_core::ExperimentId;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
pub(crate) struct RecomputeLocks {
    locks: DashMap<ExperimentId, Arc<Mutex<()>>>,
}

impl RecomputeLocks {
    /// The experiment's lock, created if missing
    ///
    /// The `Arc` is cloned out so the map shard is not held while waiting.
    pub(crate) fn lock_for(&self, experiment: ExperimentId) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .entry(experiment)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Drop the experiment's lock if nobody holds or waits on it
    ///
    /// Called when an experiment's processed data is removed, so the map
    /// does not grow with every experiment ever processed. A caller that
    /// still has the `Arc` keeps it alive and the entry stays.
    pub(crate) fn remove_if_idle(&self, experiment: ExperimentId) -> bool {
        self.locks
            .remove_if(&experiment, |_, lock| Arc::strong_count(lock) == 1)
            .is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}
