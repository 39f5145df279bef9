//! Experiments, subsets and platforms
//!
//! Callers address vectors through a [`BioAssaySet`]: either a whole
//! experiment or a subset of one. Subsets never own vectors of their own;
//! they always resolve to their source experiment and are sliced on the way
//! out.

use crate::dimension::BioAssay;
use crate::types::{ArrayDesignId, ExperimentId, SubsetId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Platform technology, used to decide whether missing-value masking applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnologyType {
    /// Single-channel arrays
    OneColor,
    /// Two-channel arrays
    TwoColor,
    /// Arrays usable in either mode
    DualMode,
    /// Sequencing-based platforms
    Sequencing,
    /// No technology (e.g. generic/pseudo platforms)
    None,
}

impl TechnologyType {
    /// Whether vectors from this technology carry a separate missing-value channel
    pub fn is_two_channel(&self) -> bool {
        !matches!(self, TechnologyType::OneColor | TechnologyType::None)
    }
}

/// An assay platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayDesign {
    /// Store-assigned id
    pub id: ArrayDesignId,
    /// Short name
    pub name: String,
    /// Technology classification; must be set before processed vectors are computed
    pub technology_type: Option<TechnologyType>,
}

impl ArrayDesign {
    /// A platform with a known technology
    pub fn new(id: ArrayDesignId, name: impl Into<String>, technology_type: TechnologyType) -> Self {
        Self {
            id,
            name: name.into(),
            technology_type: Some(technology_type),
        }
    }
}

/// A named selection of an experiment's bioassays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentSubset {
    /// Store-assigned id
    pub id: SubsetId,
    /// Display name
    pub name: String,
    /// The experiment the bioassays come from
    pub source_experiment: ExperimentId,
    /// Bioassays in the subset's order
    pub bio_assays: Vec<BioAssay>,
}

impl ExperimentSubset {
    /// Build a subset
    pub fn new(
        id: SubsetId,
        name: impl Into<String>,
        source_experiment: ExperimentId,
        bio_assays: Vec<BioAssay>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            source_experiment,
            bio_assays,
        }
    }
}

/// What a derived vector belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VectorOwner {
    /// A whole experiment
    Experiment(ExperimentId),
    /// A subset of an experiment
    Subset(SubsetId),
}

impl fmt::Display for VectorOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorOwner::Experiment(id) => write!(f, "{}", id),
            VectorOwner::Subset(id) => write!(f, "{}", id),
        }
    }
}

/// An experiment or an experiment subset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BioAssaySet {
    /// A whole experiment
    Experiment(ExperimentId),
    /// A subset, carrying its bioassay selection
    Subset(Arc<ExperimentSubset>),
}

impl BioAssaySet {
    /// The experiment whose vectors back this set
    pub fn source_experiment(&self) -> ExperimentId {
        match self {
            BioAssaySet::Experiment(id) => *id,
            BioAssaySet::Subset(subset) => subset.source_experiment,
        }
    }

    /// Whether results for this set must be sliced
    pub fn is_subset(&self) -> bool {
        matches!(self, BioAssaySet::Subset(_))
    }

    /// Owner reference recorded on vectors served for this set
    pub fn owner(&self) -> VectorOwner {
        match self {
            BioAssaySet::Experiment(id) => VectorOwner::Experiment(*id),
            BioAssaySet::Subset(subset) => VectorOwner::Subset(subset.id),
        }
    }
}

impl From<ExperimentId> for BioAssaySet {
    fn from(id: ExperimentId) -> Self {
        BioAssaySet::Experiment(id)
    }
}

impl From<ExperimentSubset> for BioAssaySet {
    fn from(subset: ExperimentSubset) -> Self {
        BioAssaySet::Subset(Arc::new(subset))
    }
}

impl fmt::Display for BioAssaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BioAssaySet::Experiment(id) => write!(f, "{}", id),
            BioAssaySet::Subset(subset) => {
                write!(f, "{} ({} of {})", subset.id, subset.name, subset.source_experiment)
            }
        }
    }
}
