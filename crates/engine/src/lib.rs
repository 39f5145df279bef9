//! Processed expression vector engine
//!
//! This crate provides:
//! - processing: present/absent masking and quantile normalization of raw vectors
//! - align: padding vectors of ragged experiments onto one dimension
//! - slice: cutting experiment vectors down to a subset's bioassays
//! - ranks: projections of precomputed expression ranks
//! - ProcessedVectorEngine: recomputation, the cached read path and rank queries
//! - EngineConfig: TOML configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod align;
pub mod config;
pub mod engine;
pub mod processing;
pub mod ranks;
pub mod slice;
pub mod warnings;

pub use align::{align_ragged, align_to_dimension, is_ragged, longest_dimension, DimensionAligner};
pub use config::{EngineConfig, CONFIG_FILE_NAME};
pub use engine::{
    EngineMetrics, ProbeRanksByExperiment, ProcessedVectorEngine, ProcessingSummary,
    RanksByExperiment,
};
pub use processing::{
    build_processed_generation, quantile_normalize, should_renormalize, MaskLengthMismatch,
    NormalizationDecision, ProcessedGeneration,
};
pub use ranks::{ProbeRanks, RankMethod};
pub use slice::{views_for_set, SubsetSlicer};
pub use warnings::WarningLimiter;
