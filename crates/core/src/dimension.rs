//! Bioassay dimensions
//!
//! A bioassay dimension is the ordered list of bioassays (sample runs) that
//! gives every position of a vector its meaning. Two vectors can only be
//! compared element-by-element when they share a dimension, or after one
//! has been aligned to the other's.

use crate::types::{ArrayDesignId, BioAssayId, BioMaterialId, DimensionId};
use rustc_hash::FxHashMap;

/// One sample's measurement run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BioAssay {
    /// Store-assigned id; `None` for placeholders inserted by alignment
    pub id: Option<BioAssayId>,
    /// Display name
    pub name: String,
    /// The biomaterial (sample) this run measured
    pub sample: BioMaterialId,
    /// Platform the run was performed on
    pub array_design: Option<ArrayDesignId>,
}

impl BioAssay {
    /// A persisted bioassay
    pub fn new(id: BioAssayId, name: impl Into<String>, sample: BioMaterialId) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            sample,
            array_design: None,
        }
    }

    /// Attach the platform the run was performed on
    pub fn on_platform(mut self, array_design: ArrayDesignId) -> Self {
        self.array_design = Some(array_design);
        self
    }

    /// Placeholder for a biomaterial that was not run on `array_design`
    pub fn placeholder(sample: BioMaterialId, array_design: Option<ArrayDesignId>) -> Self {
        let platform = array_design
            .map(|ad| ad.to_string())
            .unwrap_or_else(|| "an unknown platform".to_string());
        Self {
            id: None,
            name: format!(
                "Missing bioassay for biomaterial={} that was not run on {}",
                sample, platform
            ),
            sample,
            array_design,
        }
    }

    /// Whether this is an alignment placeholder rather than a real run
    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }
}

/// Ordered sequence of bioassays defining positional correspondence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioAssayDimension {
    /// Store-assigned id; `None` for dimensions built on the fly (aligned or sliced)
    pub id: Option<DimensionId>,
    /// Display name
    pub name: String,
    /// Bioassays in positional order
    pub bio_assays: Vec<BioAssay>,
    /// This dimension is a slice of another one
    pub is_subset: bool,
    /// The dimension this one was sliced from
    pub source_dimension: Option<DimensionId>,
}

impl BioAssayDimension {
    /// A persisted dimension
    pub fn new(id: DimensionId, name: impl Into<String>, bio_assays: Vec<BioAssay>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            bio_assays,
            is_subset: false,
            source_dimension: None,
        }
    }

    /// A dimension that exists only in memory
    pub fn transient(name: impl Into<String>, bio_assays: Vec<BioAssay>) -> Self {
        Self {
            id: None,
            name: name.into(),
            bio_assays,
            is_subset: false,
            source_dimension: None,
        }
    }

    /// Number of positions
    pub fn len(&self) -> usize {
        self.bio_assays.len()
    }

    /// Whether the dimension has no positions
    pub fn is_empty(&self) -> bool {
        self.bio_assays.is_empty()
    }

    /// Biomaterials in positional order
    pub fn samples(&self) -> impl Iterator<Item = BioMaterialId> + '_ {
        self.bio_assays.iter().map(|ba| ba.sample)
    }

    /// Map from biomaterial to its position
    ///
    /// If a biomaterial appears more than once, the first position wins.
    pub fn sample_positions(&self) -> FxHashMap<BioMaterialId, usize> {
        let mut positions =
            FxHashMap::with_capacity_and_hasher(self.bio_assays.len(), Default::default());
        for (i, ba) in self.bio_assays.iter().enumerate() {
            positions.entry(ba.sample).or_insert(i);
        }
        positions
    }

    /// Map from bioassay id to its position (placeholders are skipped)
    pub fn bio_assay_positions(&self) -> FxHashMap<BioAssayId, usize> {
        self.bio_assays
            .iter()
            .enumerate()
            .filter_map(|(i, ba)| ba.id.map(|id| (id, i)))
            .collect()
    }

    /// Whether `other` denotes the same persisted dimension
    ///
    /// Transient dimensions are never the same as anything by id; they are
    /// compared structurally.
    pub fn same_as(&self, other: &BioAssayDimension) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}
