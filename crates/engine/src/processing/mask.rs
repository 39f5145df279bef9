//! Missing-value masking
//!
//! Two-channel platforms come with present/absent calls per probe and
//! sample. Masking turns every value called absent into NaN. Vectors are
//! marked masked even when no call vector exists for their probe, so the
//! processed generation is uniformly masked-preferred.

use crate::warnings::WarningLimiter;
use exprvec_core::limits::BUILD_PROGRESS_INTERVAL;
use exprvec_core::{
    BioAssayDimension, DataVector, DesignElementId, ProcessedVector, Result, VectorId,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A call vector whose length disagrees with its data vector
///
/// The data vector is kept unmasked at every position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskLengthMismatch {
    /// Probe of both vectors
    pub design_element: DesignElementId,
    /// The data vector
    pub vector: VectorId,
    /// The present/absent vector
    pub mask_vector: VectorId,
    /// Data length
    pub data_len: usize,
    /// Call vector length
    pub mask_len: usize,
}

/// Result of masking the preferred vectors of one experiment
#[derive(Debug, Clone, PartialEq)]
pub struct MaskingOutcome {
    /// Unpacked, masked vectors in input order
    pub vectors: Vec<ProcessedVector>,
    /// Present/absent calls existed for the experiment
    pub masking_applied: bool,
    /// Vectors for which no call vector was found
    pub without_mask: usize,
    /// Call vectors that could not be applied
    pub mismatches: Vec<MaskLengthMismatch>,
}

/// Set every value called absent to NaN
///
/// Returns `None` if the lengths differ. Applying the same calls again
/// gives the same result.
pub fn apply_mask(data: &[f64], present: &[bool]) -> Option<Vec<f64>> {
    if data.len() != present.len() {
        return None;
    }
    Some(
        data.iter()
            .zip(present)
            .map(|(&v, &p)| if p { v } else { f64::NAN })
            .collect(),
    )
}

/// Apply calls recorded on another dimension, matching positions by biomaterial
///
/// Data positions whose biomaterial has no call stay unchanged. Returns
/// `None` if no biomaterial is shared.
fn mask_by_sample(
    data: &[f64],
    data_dimension: &BioAssayDimension,
    present: &[bool],
    call_dimension: &BioAssayDimension,
) -> Option<Vec<f64>> {
    let positions = call_dimension.sample_positions();
    let mut shared = false;
    let masked: Vec<f64> = data
        .iter()
        .zip(data_dimension.samples())
        .map(|(&v, sample)| match positions.get(&sample) {
            Some(&i) => {
                shared = true;
                if present[i] {
                    v
                } else {
                    f64::NAN
                }
            }
            None => v,
        })
        .collect();
    shared.then_some(masked)
}

/// Unpack preferred vectors and apply present/absent calls
///
/// Calls are matched by probe, preferring the call vector on the same
/// dimension as the data. A call vector on another dimension is applied
/// by biomaterial, never by position.
///
/// # Errors
/// - `UnsupportedRepresentation` if a data vector is not double-valued or a
///   call vector is not boolean
/// - `PayloadLengthMismatch` if a data vector disagrees with its dimension
pub fn mask_and_unpack(
    preferred: &[DataVector],
    missing_values: &[DataVector],
    warnings: &mut WarningLimiter,
) -> Result<MaskingOutcome> {
    let mut calls: FxHashMap<DesignElementId, Vec<&DataVector>> = FxHashMap::default();
    for mv in missing_values {
        calls.entry(mv.design_element).or_default().push(mv);
    }
    let masking_applied = !calls.is_empty();

    let mut vectors = Vec::with_capacity(preferred.len());
    let mut without_mask = 0;
    let mut mismatches = Vec::new();

    for vector in preferred {
        vector.check_length()?;
        let data = vector.doubles()?;

        let call = calls.get(&vector.design_element).and_then(|candidates| {
            candidates
                .iter()
                .find(|c| c.dimension.same_as(&vector.dimension))
                .or_else(|| candidates.first())
                .copied()
        });

        let masked = match call {
            None => {
                if masking_applied {
                    without_mask += 1;
                    debug!(
                        design_element = %vector.design_element,
                        "No missing value vector for design element"
                    );
                }
                data.to_vec()
            }
            Some(call) => {
                let present = call.booleans()?;
                let same_dimension = call.dimension.same_as(&vector.dimension);
                if present.len() != data.len()
                    || (!same_dimension && present.len() != call.dimension.len())
                {
                    let mismatch = MaskLengthMismatch {
                        design_element: vector.design_element,
                        vector: vector.id,
                        mask_vector: call.id,
                        data_len: data.len(),
                        mask_len: present.len(),
                    };
                    warnings.report(|| {
                        warn!(
                            design_element = %mismatch.design_element,
                            vector = %mismatch.vector,
                            data_len = mismatch.data_len,
                            mask_len = mismatch.mask_len,
                            "Missing value vector length does not match data; leaving values unmasked"
                        )
                    });
                    mismatches.push(mismatch);
                    data.to_vec()
                } else if same_dimension {
                    apply_mask(data, present).unwrap_or_else(|| data.to_vec())
                } else {
                    match mask_by_sample(data, &vector.dimension, present, &call.dimension) {
                        Some(masked) => masked,
                        None => {
                            without_mask += 1;
                            debug!(
                                design_element = %vector.design_element,
                                mask_vector = %call.id,
                                "Missing value vector shares no biomaterial with data"
                            );
                            data.to_vec()
                        }
                    }
                }
            }
        };

        vectors.push(ProcessedVector::new(
            vector.design_element,
            Arc::clone(&vector.dimension),
            masked,
        ));
        if vectors.len() % BUILD_PROGRESS_INTERVAL == 0 {
            debug!(built = vectors.len(), total = preferred.len(), "Unpacked vectors");
        }
    }

    if without_mask > 0 {
        warn!(
            without_mask,
            total = preferred.len(),
            "Some design elements have no missing value vector; they are marked masked unchanged"
        );
    }
    warnings.finish();

    Ok(MaskingOutcome {
        vectors,
        masking_applied,
        without_mask,
        mismatches,
    })
}
