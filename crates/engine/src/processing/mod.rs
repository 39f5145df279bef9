//! Masking and normalization pipeline
//!
//! Turns an experiment's preferred raw vectors (plus present/absent calls
//! on two-channel platforms) into a complete processed generation, held in
//! memory. Nothing here touches the store: every integrity check runs
//! before the caller installs the generation, so a failure never leaves a
//! partial write behind.

pub mod mask;
pub mod normalize;

pub use mask::{apply_mask, mask_and_unpack, MaskLengthMismatch, MaskingOutcome};
pub use normalize::{quantile_normalize, should_renormalize, NormalizationDecision};

use crate::config::EngineConfig;
use crate::warnings::WarningLimiter;
use exprvec_core::{DataVector, Error, ExperimentId, ProcessedVector, QuantitationType, Result};
use rustc_hash::FxHashSet;
use tracing::info;

/// A processed generation ready to be installed
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedGeneration {
    /// One vector per design element
    pub vectors: Vec<ProcessedVector>,
    /// Derived quantitation type for the vectors (not yet persisted)
    pub quantitation_type: QuantitationType,
    /// Whether quantile normalization ran
    pub normalization: NormalizationDecision,
    /// Present/absent calls existed and were applied
    pub masking_applied: bool,
    /// Vectors for which no call vector was found
    pub vectors_without_mask: usize,
    /// Call vectors that could not be applied
    pub mask_mismatches: Vec<MaskLengthMismatch>,
}

/// Build a processed generation from preferred raw vectors
///
/// `missing_values` should be empty for single-channel platforms.
///
/// # Errors
/// - `NoPreferredData` if `preferred` is empty
/// - `DuplicateDesignElement` if a design element has two preferred vectors
/// - `UnsupportedRepresentation` / `PayloadLengthMismatch` for malformed vectors
pub fn build_processed_generation(
    experiment: ExperimentId,
    preferred: &[DataVector],
    missing_values: &[DataVector],
    config: &EngineConfig,
) -> Result<ProcessedGeneration> {
    let exemplar = preferred
        .first()
        .ok_or(Error::NoPreferredData { experiment })?;

    let mut seen = FxHashSet::default();
    for vector in preferred {
        if !seen.insert(vector.design_element) {
            return Err(Error::DuplicateDesignElement {
                experiment,
                design_element: vector.design_element,
            });
        }
    }

    let mut warnings = WarningLimiter::new("missing value length mismatches", config.mask_warning_limit);
    let masking = mask_and_unpack(preferred, missing_values, &mut warnings)?;
    let mut vectors = masking.vectors;

    let quantitation_type = exemplar.quantitation_type.derive_processed();
    let single_dimension = vectors
        .iter()
        .all(|v| v.dimension.same_as(&exemplar.dimension));
    let normalization = should_renormalize(
        &quantitation_type,
        vectors.len(),
        single_dimension,
        config.min_size_for_renormalization,
    );

    if normalization.applied() {
        info!(%experiment, vectors = vectors.len(), "Normalizing the data");
        let mut rows: Vec<Vec<f64>> = vectors.iter_mut().map(|v| std::mem::take(&mut v.data)).collect();
        quantile_normalize(&mut rows);
        for (vector, row) in vectors.iter_mut().zip(rows) {
            vector.data = row;
        }
    } else {
        info!(%experiment, decision = %normalization, "Normalization skipped for this data set");
    }

    Ok(ProcessedGeneration {
        vectors,
        quantitation_type,
        normalization,
        masking_applied: masking.masking_applied,
        vectors_without_mask: masking.without_mask,
        mask_mismatches: masking.mismatches,
    })
}
