//! Derived vector cache
//!
//! Keyed by `(ExperimentId, GeneId)`. An entry always holds *every* derived
//! vector the gene has in the experiment; a gene with no vectors is cached
//! as an empty entry. Subsets are never cached, they resolve to their
//! source experiment and are sliced after retrieval.
//!
//! # Design
//!
//! - DashMap: one shard per experiment, so experiments never contend
//! - FxHashMap: gene lookups inside a shard
//! - Epochs: `invalidate` bumps the experiment's epoch and `clear` bumps a
//!   global epoch. A reader takes a [`CacheToken`] before fetching from the
//!   store and hands it back to `put`; the put is dropped if either epoch
//!   moved in between, so a fetch that raced a recomputation can never
//!   repopulate the cache with the previous generation.

use dashmap::DashMap;
use exprvec_core::{DerivedVectorView, ExperimentId, GeneId};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries written
    pub insertions: u64,
    /// Puts dropped because the experiment was invalidated meanwhile
    pub stale_puts: u64,
    /// Experiment invalidations
    pub invalidations: u64,
    /// Experiments with at least one cached gene
    pub cached_experiments: usize,
    /// Total cached (experiment, gene) entries
    pub cached_entries: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 when nothing was looked up
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Proof of which cache generation a fetch started from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheToken {
    experiment: ExperimentId,
    epoch: u64,
    global_epoch: u64,
}

impl CacheToken {
    /// Experiment the token was taken for
    pub fn experiment(&self) -> ExperimentId {
        self.experiment
    }
}

/// Cache of derived vectors keyed by experiment and gene
///
/// # Thread Safety
///
/// All methods take `&self`; implementations synchronize internally.
pub trait DerivedVectorCache: Send + Sync {
    /// Cached vectors for the gene, `None` on a miss
    fn get(&self, experiment: ExperimentId, gene: GeneId) -> Option<Vec<DerivedVectorView>>;

    /// Token for the experiment's current generation; take it before fetching
    fn token(&self, experiment: ExperimentId) -> CacheToken;

    /// Store the complete vector set for a gene
    ///
    /// Returns `false` (and stores nothing) if the experiment was
    /// invalidated or the cache cleared after `token` was taken.
    fn put(&self, token: CacheToken, gene: GeneId, vectors: Vec<DerivedVectorView>) -> bool;

    /// Drop every entry of the experiment
    fn invalidate(&self, experiment: ExperimentId);

    /// Drop every entry
    fn clear(&self);

    /// Current counters
    fn stats(&self) -> CacheStats;
}

#[derive(Debug, Default)]
struct ExperimentShard {
    epoch: u64,
    genes: FxHashMap<GeneId, Vec<DerivedVectorView>>,
}

/// In-memory cache sharded by experiment
#[derive(Debug, Default)]
pub struct ShardedVectorCache {
    shards: DashMap<ExperimentId, ExperimentShard>,
    global_epoch: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    stale_puts: AtomicU64,
    invalidations: AtomicU64,
}

impl ShardedVectorCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything is cached for the experiment
    pub fn contains_experiment(&self, experiment: ExperimentId) -> bool {
        self.shards
            .get(&experiment)
            .map(|shard| !shard.genes.is_empty())
            .unwrap_or(false)
    }
}

impl DerivedVectorCache for ShardedVectorCache {
    fn get(&self, experiment: ExperimentId, gene: GeneId) -> Option<Vec<DerivedVectorView>> {
        let found = self
            .shards
            .get(&experiment)
            .and_then(|shard| shard.genes.get(&gene).cloned());
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    fn token(&self, experiment: ExperimentId) -> CacheToken {
        // Global epoch first: a clear() between the two reads then shows up
        // as a global mismatch at put time.
        let global_epoch = self.global_epoch.load(Ordering::Acquire);
        let epoch = self
            .shards
            .get(&experiment)
            .map(|shard| shard.epoch)
            .unwrap_or(0);
        CacheToken {
            experiment,
            epoch,
            global_epoch,
        }
    }

    fn put(&self, token: CacheToken, gene: GeneId, vectors: Vec<DerivedVectorView>) -> bool {
        // Epochs are compared under the shard lock so invalidate/clear
        // cannot slip in between the check and the insert.
        let mut shard = self.shards.entry(token.experiment).or_default();
        if shard.epoch != token.epoch
            || self.global_epoch.load(Ordering::Acquire) != token.global_epoch
        {
            self.stale_puts.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        shard.genes.insert(gene, vectors);
        self.insertions.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn invalidate(&self, experiment: ExperimentId) {
        let mut shard = self.shards.entry(experiment).or_default();
        shard.epoch += 1;
        let dropped = shard.genes.len();
        shard.genes.clear();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        debug!(%experiment, dropped, "Invalidated cached vectors");
    }

    fn clear(&self) {
        self.global_epoch.fetch_add(1, Ordering::AcqRel);
        self.shards.clear();
        debug!("Cleared vector cache");
    }

    fn stats(&self) -> CacheStats {
        let mut cached_experiments = 0;
        let mut cached_entries = 0;
        for shard in self.shards.iter() {
            if !shard.genes.is_empty() {
                cached_experiments += 1;
                cached_entries += shard.genes.len();
            }
        }
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            stale_puts: self.stale_puts.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            cached_experiments,
            cached_entries,
        }
    }
}
