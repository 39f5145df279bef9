//! The vector store contract
//!
//! The engine never talks to a database directly. Everything it needs
//! from persistence goes through [`VectorStore`], which returns fully
//! materialized values (no lazy loading, no session). Implementations must
//! be `Send + Sync`: the engine is shared across request threads.

use crate::dimension::BioAssayDimension;
use crate::error::{Error, Result};
use crate::experiment::ArrayDesign;
use crate::quantitation::QuantitationType;
use crate::types::{DesignElementId, ExperimentId, GeneId};
use crate::vector::{DataVector, ProcessedVector};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Probe to gene associations
pub type ProbeGeneMap = FxHashMap<DesignElementId, BTreeSet<GeneId>>;

/// Result of persisting a processed generation
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedGeneration {
    /// The quantitation type as persisted (with its id)
    pub quantitation_type: Arc<QuantitationType>,
    /// Number of vectors written
    pub vector_count: usize,
}

/// Persistence collaborator supplying and storing vectors
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine calls them from many
/// threads at once. Only `replace_processed_vectors` and
/// `delete_processed_vectors` mutate, and the engine serializes those per
/// experiment.
pub trait VectorStore: Send + Sync {
    /// Raw vectors of the experiment whose quantitation type is preferred
    fn fetch_preferred_raw_vectors(&self, experiment: ExperimentId) -> Result<Vec<DataVector>>;

    /// Raw present/absent indicator vectors of the experiment
    fn fetch_missing_value_vectors(&self, experiment: ExperimentId) -> Result<Vec<DataVector>>;

    /// Every bioassay dimension used by the experiment's vectors
    fn fetch_bio_assay_dimensions(
        &self,
        experiment: ExperimentId,
    ) -> Result<Vec<Arc<BioAssayDimension>>>;

    /// Platforms used by the experiment
    fn array_designs_used(&self, experiment: ExperimentId) -> Result<Vec<ArrayDesign>>;

    /// Genes associated with each probe; probes without genes may be absent
    fn resolve_probes_to_genes(&self, probes: &[DesignElementId]) -> Result<ProbeGeneMap>;

    /// Probes measured in the experiment that are associated with any of the genes
    fn probes_for_genes(
        &self,
        experiment: ExperimentId,
        genes: &[GeneId],
    ) -> Result<Vec<DesignElementId>>;

    /// Processed vectors of the experiment for the given probes
    fn fetch_processed_vectors(
        &self,
        experiment: ExperimentId,
        probes: &[DesignElementId],
    ) -> Result<Vec<DataVector>>;

    /// Every processed vector of the experiment
    fn fetch_all_processed_vectors(&self, experiment: ExperimentId) -> Result<Vec<DataVector>>;

    /// Write a processed generation and attach its quantitation type to the experiment
    fn persist_processed_vectors(
        &self,
        experiment: ExperimentId,
        vectors: Vec<ProcessedVector>,
        quantitation_type: QuantitationType,
    ) -> Result<PersistedGeneration>;

    /// Delete the experiment's processed vectors and their quantitation type
    ///
    /// Returns the number of vectors removed; deleting nothing is not an error.
    fn delete_processed_vectors(&self, experiment: ExperimentId) -> Result<usize>;

    /// Replace the processed generation: delete, then persist
    ///
    /// Stores with transactions should override this so the delete and the
    /// insert commit together; the default runs them back to back.
    fn replace_processed_vectors(
        &self,
        experiment: ExperimentId,
        vectors: Vec<ProcessedVector>,
        quantitation_type: QuantitationType,
    ) -> Result<PersistedGeneration> {
        self.delete_processed_vectors(experiment)?;
        self.persist_processed_vectors(experiment, vectors, quantitation_type)
    }

    /// Whether any platform used by the experiment is two-channel
    ///
    /// # Errors
    /// `MissingTechnologyType` if a platform has no technology classification.
    fn is_two_channel(&self, experiment: ExperimentId) -> Result<bool> {
        let mut two_channel = false;
        for design in self.array_designs_used(experiment)? {
            match design.technology_type {
                None => {
                    return Err(Error::MissingTechnologyType {
                        experiment,
                        array_design: design.id,
                    })
                }
                Some(tt) if tt.is_two_channel() => two_channel = true,
                Some(_) => {}
            }
        }
        Ok(two_channel)
    }
}
