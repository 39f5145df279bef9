//! The processed vector engine
//!
//! `ProcessedVectorEngine` ties the pieces together:
//! - recomputation: fetch raw vectors, mask, normalize, install the new
//!   generation, invalidate the cache
//! - the read path: cache lookup per (experiment, gene), batched store
//!   fetches on a miss, alignment of ragged dimensions, subset slicing
//! - rank queries on top of the read path
//!
//! # Concurrency
//!
//! Every method takes `&self`; the engine is meant to be shared behind an
//! `Arc`. Writes to one experiment are serialized by a per-experiment lock.
//! Reads take no lock: a read racing a recomputation may return the
//! previous generation, but cache tokens guarantee it is not cached after
//! the recomputation's invalidation.

mod locks;
mod rank_queries;
mod read;

pub use rank_queries::{ProbeRanksByExperiment, RanksByExperiment};

use crate::config::EngineConfig;
use crate::processing::{build_processed_generation, MaskLengthMismatch, NormalizationDecision};
use exprvec_core::{
    Error, ExperimentId, PersistedGeneration, ProcessedVector, QuantitationType, Result,
    VectorStore,
};
use exprvec_storage::{CacheStats, DerivedVectorCache, ShardedVectorCache};
use locks::RecomputeLocks;
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// What a recomputation produced
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingSummary {
    /// The recomputed experiment
    pub experiment: ExperimentId,
    /// Processed vectors written
    pub vector_count: usize,
    /// The new processed quantitation type, as persisted
    pub quantitation_type: Arc<QuantitationType>,
    /// Whether quantile normalization ran
    pub normalization: NormalizationDecision,
    /// Present/absent calls existed and were applied
    pub masking_applied: bool,
    /// Vectors for which no call vector was found
    pub vectors_without_mask: usize,
    /// Call vectors whose length disagreed with their data
    pub mask_mismatches: Vec<MaskLengthMismatch>,
}

/// Snapshot of engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// Generations installed (recomputed or replaced)
    pub generations_installed: u64,
    /// Recomputations or replacements that failed
    pub failed_installs: u64,
    /// Processed generations removed
    pub removals: u64,
}

/// Derives, stores and serves processed expression vectors
///
/// # Thread Safety
///
/// `Send + Sync`; share it behind an `Arc`.
pub struct ProcessedVectorEngine {
    store: Arc<dyn VectorStore>,
    cache: Arc<dyn DerivedVectorCache>,
    config: EngineConfig,
    locks: RecomputeLocks,
    generations_installed: AtomicU64,
    failed_installs: AtomicU64,
    removals: AtomicU64,
}

impl ProcessedVectorEngine {
    /// Create an engine
    ///
    /// # Errors
    /// `Config` if the configuration is invalid.
    pub fn new(
        store: Arc<dyn VectorStore>,
        cache: Arc<dyn DerivedVectorCache>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            cache,
            config,
            locks: RecomputeLocks::default(),
            generations_installed: AtomicU64::new(0),
            failed_installs: AtomicU64::new(0),
            removals: AtomicU64::new(0),
        })
    }

    /// Engine with a fresh in-memory cache and the default configuration
    pub fn with_store(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            cache: Arc::new(ShardedVectorCache::new()),
            config: EngineConfig::default(),
            locks: RecomputeLocks::default(),
            generations_installed: AtomicU64::new(0),
            failed_installs: AtomicU64::new(0),
            removals: AtomicU64::new(0),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The vector store
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Recompute the experiment's processed vectors from its raw data
    ///
    /// Runs masking and (when the data qualify) quantile normalization in
    /// memory, then replaces the previous processed generation and its
    /// quantitation type in one store call and invalidates the cache.
    /// Concurrent calls for the same experiment run one after the other.
    ///
    /// # Errors
    /// - `MissingTechnologyType` if a platform has no technology type
    /// - `NoPreferredData` if there are no preferred raw vectors
    /// - `DuplicateDesignElement` if a probe has two preferred vectors
    /// - store errors
    ///
    /// On error nothing has been written, except what a failing store
    /// itself may have done.
    pub fn compute_processed_vectors(&self, experiment: ExperimentId) -> Result<ProcessingSummary> {
        let lock = self.locks.lock_for(experiment);
        let _guard = lock.lock();

        info!(%experiment, "Computing processed vectors");
        let result = self.recompute_locked(experiment);
        match &result {
            Ok(summary) => {
                self.generations_installed.fetch_add(1, Ordering::Relaxed);
                info!(
                    %experiment,
                    vectors = summary.vector_count,
                    normalization = %summary.normalization,
                    masking_applied = summary.masking_applied,
                    mask_mismatches = summary.mask_mismatches.len(),
                    "Processed vectors computed"
                );
            }
            Err(e) => {
                self.failed_installs.fetch_add(1, Ordering::Relaxed);
                warn!(%experiment, error = %e, "Processed vector computation failed");
            }
        }
        result
    }

    fn recompute_locked(&self, experiment: ExperimentId) -> Result<ProcessingSummary> {
        let two_channel = self.store.is_two_channel(experiment)?;
        let preferred = self.store.fetch_preferred_raw_vectors(experiment)?;
        if preferred.is_empty() {
            return Err(Error::NoPreferredData { experiment });
        }
        let missing_values = if two_channel {
            self.store.fetch_missing_value_vectors(experiment)?
        } else {
            Vec::new()
        };

        let generation =
            build_processed_generation(experiment, &preferred, &missing_values, &self.config)?;

        let persisted = self.install(
            experiment,
            generation.vectors,
            generation.quantitation_type,
        )?;

        Ok(ProcessingSummary {
            experiment,
            vector_count: persisted.vector_count,
            quantitation_type: persisted.quantitation_type,
            normalization: generation.normalization,
            masking_applied: generation.masking_applied,
            vectors_without_mask: generation.vectors_without_mask,
            mask_mismatches: generation.mask_mismatches,
        })
    }

    /// Replace the store's generation and invalidate the cache either way
    fn install(
        &self,
        experiment: ExperimentId,
        vectors: Vec<ProcessedVector>,
        quantitation_type: QuantitationType,
    ) -> Result<PersistedGeneration> {
        let result = self
            .store
            .replace_processed_vectors(experiment, vectors, quantitation_type);
        self.cache.invalidate(experiment);
        result
    }

    /// Install a caller-built processed generation
    ///
    /// Replaces the previous generation and its quantitation type, then
    /// invalidates the cache. Serialized with recomputation of the same
    /// experiment.
    ///
    /// # Errors
    /// - `EmptyVectorSet` if `vectors` is empty
    /// - `DuplicateDesignElement` if a probe appears twice
    /// - store errors
    pub fn replace_processed_vectors(
        &self,
        experiment: ExperimentId,
        vectors: Vec<ProcessedVector>,
        quantitation_type: QuantitationType,
    ) -> Result<PersistedGeneration> {
        if vectors.is_empty() {
            return Err(Error::EmptyVectorSet { experiment });
        }
        let mut seen = FxHashSet::default();
        if let Some(dup) = vectors.iter().find(|v| !seen.insert(v.design_element)) {
            return Err(Error::DuplicateDesignElement {
                experiment,
                design_element: dup.design_element,
            });
        }

        let lock = self.locks.lock_for(experiment);
        let _guard = lock.lock();
        let result = self.install(experiment, vectors, quantitation_type);
        match &result {
            Ok(persisted) => {
                self.generations_installed.fetch_add(1, Ordering::Relaxed);
                info!(%experiment, vectors = persisted.vector_count, "Replaced processed vectors");
            }
            Err(_) => {
                self.failed_installs.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    /// Delete the experiment's processed vectors and their quantitation type
    ///
    /// Invalidates the cache and releases the experiment's recomputation
    /// lock. Returns the number of vectors removed.
    pub fn remove_processed_vectors(&self, experiment: ExperimentId) -> Result<usize> {
        let lock = self.locks.lock_for(experiment);
        let removed = {
            let _guard = lock.lock();
            let result = self.store.delete_processed_vectors(experiment);
            self.cache.invalidate(experiment);
            result?
        };
        drop(lock);
        self.locks.remove_if_idle(experiment);
        self.removals.fetch_add(1, Ordering::Relaxed);
        info!(%experiment, removed, "Removed processed vectors");
        Ok(removed)
    }

    // ========================================================================
    // Cache management
    // ========================================================================

    /// Drop cached vectors for one experiment, or for all when `None`
    pub fn clear_cache(&self, experiment: Option<ExperimentId>) {
        match experiment {
            Some(experiment) => self.cache.invalidate(experiment),
            None => self.cache.clear(),
        }
    }

    /// Cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Engine counters
    pub fn metrics(&self) -> EngineMetrics {
        EngineMetrics {
            generations_installed: self.generations_installed.load(Ordering::Relaxed),
            failed_installs: self.failed_installs.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
        }
    }

    #[cfg(test)]
    pub(crate) fn lock_count(&self) -> usize {
        self.locks.len()
    }
}
