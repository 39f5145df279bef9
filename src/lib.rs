//! exprvec - processed expression data vectors
//!
//! Turns an experiment's raw expression measurements into analysis-ready
//! processed vectors and serves them:
//! - recomputation masks absent calls and quantile normalizes the data
//! - the read path fetches vectors by gene or probe, aligns experiments
//!   that use several bioassay dimensions and slices experiment subsets
//! - a derived vector cache keyed by (experiment, gene) fronts the store
//! - rank accessors project precomputed expression ranks
//!
//! # Quick Start
//!
//! ```ignore
//! use exprvec::{BioAssaySet, GeneId, InMemoryVectorStore, ProcessedVectorEngine};
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryVectorStore::new());
//! // ... load an experiment into the store ...
//! let engine = ProcessedVectorEngine::with_store(store);
//! engine.compute_processed_vectors(experiment)?;
//! let views = engine.get_processed_vectors(&[BioAssaySet::from(experiment)], &[GeneId::new(7)])?;
//! ```
//!
//! # Architecture
//!
//! - `exprvec-core`: domain types, errors and the `VectorStore` trait
//! - `exprvec-storage`: the derived vector cache and an in-memory store
//! - `exprvec-engine`: processing, alignment, slicing and the engine

pub use exprvec_core::*;
pub use exprvec_engine::*;
pub use exprvec_storage::*;
