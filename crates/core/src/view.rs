//! Derived vector views
//!
//! A [`DerivedVectorView`] is the value object handed to callers: a vector's
//! numeric payload plus lightweight references to its probe, dimension,
//! owning experiment-or-subset, genes and ranks. Views are never persisted.
//! A view built by slicing has no id of its own and records the vector it
//! was cut from in `source_vector_id`.

use crate::dimension::{BioAssay, BioAssayDimension};
use crate::error::{Error, Result};
use crate::experiment::VectorOwner;
use crate::quantitation::{PrimitiveType, QuantitationType};
use crate::types::{DesignElementId, ExperimentId, GeneId, VectorId};
use crate::vector::{DataVector, ProcessedVector};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Identity used to de-duplicate result sets
///
/// Persisted views are identified by their vector id, slices by the vector
/// they were cut from. The owner keeps the same vector sliced for two
/// subsets apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewKey {
    /// Experiment or subset the view is served for
    pub owner: VectorOwner,
    /// Vector id, or source vector id for slices
    pub vector: Option<VectorId>,
    /// Probe
    pub design_element: DesignElementId,
}

/// Analysis-ready vector served to callers
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedVectorView {
    /// Persisted vector id; `None` for slices
    pub id: Option<VectorId>,
    /// For slices, the persisted vector the values were taken from
    pub source_vector_id: Option<VectorId>,
    /// Experiment or subset this view is served for
    pub owner: VectorOwner,
    /// Experiment that owns the underlying persisted vector
    pub experiment: ExperimentId,
    /// Probe
    pub design_element: DesignElementId,
    /// What the values mean
    pub quantitation_type: Arc<QuantitationType>,
    /// Positional meaning of `data`
    pub dimension: Arc<BioAssayDimension>,
    /// The values; missing values are NaN
    pub data: Vec<f64>,
    /// Genes the probe is associated with
    pub genes: BTreeSet<GeneId>,
    /// Rank by mean, if assigned
    pub rank_by_mean: Option<f64>,
    /// Rank by max, if assigned
    pub rank_by_max: Option<f64>,
    /// Missing values have been applied
    pub masked: bool,
    /// Gaps were inserted to match another dimension
    pub reorganized: bool,
    /// This view is a subset slice
    pub sliced: bool,
}

impl DerivedVectorView {
    /// Unpack a stored double vector
    ///
    /// # Errors
    /// - `UnsupportedRepresentation` if the quantitation type or payload is not double-valued
    /// - `PayloadLengthMismatch` if the payload does not match the dimension
    pub fn from_data_vector(vector: &DataVector, genes: BTreeSet<GeneId>) -> Result<Self> {
        let qt = &vector.quantitation_type;
        if qt.representation != PrimitiveType::Double {
            return Err(Error::UnsupportedRepresentation {
                vector: vector.id,
                expected: PrimitiveType::Double,
                actual: qt.representation,
            });
        }
        vector.check_length()?;
        let data = vector.doubles()?.to_vec();
        let (rank_by_mean, rank_by_max) = vector.ranks();

        Ok(Self {
            id: Some(vector.id),
            source_vector_id: None,
            owner: VectorOwner::Experiment(vector.experiment),
            experiment: vector.experiment,
            design_element: vector.design_element,
            quantitation_type: Arc::clone(qt),
            dimension: Arc::clone(&vector.dimension),
            data,
            genes,
            rank_by_mean,
            rank_by_max,
            masked: qt.is_masked_preferred,
            reorganized: false,
            sliced: false,
        })
    }

    /// De-duplication key
    pub fn key(&self) -> ViewKey {
        ViewKey {
            owner: self.owner,
            vector: self.id.or(self.source_vector_id),
            design_element: self.design_element,
        }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether there are no values
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bioassays in positional order
    pub fn bio_assays(&self) -> &[BioAssay] {
        &self.dimension.bio_assays
    }

    /// Whether this view is a slice of another vector
    pub fn is_sliced(&self) -> bool {
        self.sliced
    }

    /// Copy of the data rescaled to mean 0 and variance 1
    ///
    /// Missing values stay missing and are ignored when computing the mean
    /// and the (sample) standard deviation. If fewer than two values are
    /// present or they are all equal, every present value becomes 0.0.
    pub fn standardize(&self) -> Vec<f64> {
        let present: Vec<f64> = self.data.iter().copied().filter(|v| !v.is_nan()).collect();
        let n = present.len();
        let mean = if n > 0 {
            present.iter().sum::<f64>() / n as f64
        } else {
            0.0
        };
        let sd = if n > 1 {
            let ss: f64 = present.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };

        self.data
            .iter()
            .map(|&v| {
                if v.is_nan() {
                    f64::NAN
                } else if sd > 0.0 {
                    (v - mean) / sd
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Turn this view back into a persistable processed vector
    pub fn to_processed_vector(&self) -> ProcessedVector {
        ProcessedVector {
            design_element: self.design_element,
            dimension: Arc::clone(&self.dimension),
            data: self.data.clone(),
            rank_by_mean: self.rank_by_mean,
            rank_by_max: self.rank_by_max,
        }
    }
}
