//! Design element data vectors
//!
//! A data vector holds one design element's values across every bioassay of
//! a dimension. Raw and processed vectors share one representation and are
//! told apart by [`VectorKind`]; only processed vectors carry rank
//! statistics.
//!
//! Invariant: `payload.len() == dimension.len()` for every persisted vector.

use crate::dimension::BioAssayDimension;
use crate::error::{Error, Result};
use crate::quantitation::{PrimitiveType, QuantitationType};
use crate::types::{DesignElementId, ExperimentId, VectorId};
use std::sync::Arc;

/// Raw versus processed, with the processed-only rank fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VectorKind {
    /// Produced upstream by data loaders
    Raw,
    /// Produced by the masking/normalization pipeline
    Processed {
        /// Rank of the vector's mean expression within the experiment
        rank_by_mean: Option<f64>,
        /// Rank of the vector's maximum expression within the experiment
        rank_by_max: Option<f64>,
    },
}

impl VectorKind {
    /// Processed kind with no ranks assigned yet
    pub const fn processed() -> Self {
        VectorKind::Processed {
            rank_by_mean: None,
            rank_by_max: None,
        }
    }
}

/// Unpacked vector values
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Numeric values; missing values are NaN
    Doubles(Vec<f64>),
    /// Boolean calls; `true` means present
    Booleans(Vec<bool>),
}

impl Payload {
    /// Number of values
    pub fn len(&self) -> usize {
        match self {
            Payload::Doubles(v) => v.len(),
            Payload::Booleans(v) => v.len(),
        }
    }

    /// Whether there are no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Primitive representation of the values
    pub fn representation(&self) -> PrimitiveType {
        match self {
            Payload::Doubles(_) => PrimitiveType::Double,
            Payload::Booleans(_) => PrimitiveType::Boolean,
        }
    }

    /// Numeric values, if this is a double payload
    pub fn as_doubles(&self) -> Option<&[f64]> {
        match self {
            Payload::Doubles(v) => Some(v),
            Payload::Booleans(_) => None,
        }
    }

    /// Boolean calls, if this is a boolean payload
    pub fn as_booleans(&self) -> Option<&[bool]> {
        match self {
            Payload::Booleans(v) => Some(v),
            Payload::Doubles(_) => None,
        }
    }
}

/// A persisted vector as returned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct DataVector {
    /// Store-assigned id
    pub id: VectorId,
    /// Owning experiment
    pub experiment: ExperimentId,
    /// Probe the values were measured on
    pub design_element: DesignElementId,
    /// What the values mean
    pub quantitation_type: Arc<QuantitationType>,
    /// Positional meaning of the values
    pub dimension: Arc<BioAssayDimension>,
    /// Raw or processed
    pub kind: VectorKind,
    /// The values
    pub payload: Payload,
}

impl DataVector {
    /// Whether this is a processed vector
    pub fn is_processed(&self) -> bool {
        matches!(self.kind, VectorKind::Processed { .. })
    }

    /// `(rank_by_mean, rank_by_max)`; both `None` for raw vectors
    pub fn ranks(&self) -> (Option<f64>, Option<f64>) {
        match self.kind {
            VectorKind::Raw => (None, None),
            VectorKind::Processed {
                rank_by_mean,
                rank_by_max,
            } => (rank_by_mean, rank_by_max),
        }
    }

    /// Check the payload/dimension length invariant
    pub fn check_length(&self) -> Result<()> {
        if self.payload.len() != self.dimension.len() {
            return Err(Error::PayloadLengthMismatch {
                vector: self.id,
                expected: self.dimension.len(),
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    /// Numeric values, failing if the payload is not double-valued
    pub fn doubles(&self) -> Result<&[f64]> {
        self.payload
            .as_doubles()
            .ok_or(Error::UnsupportedRepresentation {
                vector: self.id,
                expected: PrimitiveType::Double,
                actual: self.payload.representation(),
            })
    }

    /// Boolean calls, failing if the payload is not boolean
    pub fn booleans(&self) -> Result<&[bool]> {
        self.payload
            .as_booleans()
            .ok_or(Error::UnsupportedRepresentation {
                vector: self.id,
                expected: PrimitiveType::Boolean,
                actual: self.payload.representation(),
            })
    }
}

/// A processed vector that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedVector {
    /// Probe the values were measured on
    pub design_element: DesignElementId,
    /// Positional meaning of the values
    pub dimension: Arc<BioAssayDimension>,
    /// Masked and possibly normalized values
    pub data: Vec<f64>,
    /// Rank by mean, if already known
    pub rank_by_mean: Option<f64>,
    /// Rank by max, if already known
    pub rank_by_max: Option<f64>,
}

impl ProcessedVector {
    /// A processed vector without ranks
    pub fn new(
        design_element: DesignElementId,
        dimension: Arc<BioAssayDimension>,
        data: Vec<f64>,
    ) -> Self {
        Self {
            design_element,
            dimension,
            data,
            rank_by_mean: None,
            rank_by_max: None,
        }
    }
}
