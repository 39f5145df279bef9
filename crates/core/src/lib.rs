//! Core types and traits for exprvec
//!
//! This crate defines the foundational types used throughout the engine:
//! - Identifiers: ExperimentId, DesignElementId, GeneId, ... (one newtype per entity)
//! - QuantitationType: what a vector's numbers mean
//! - BioAssayDimension: positional meaning of a vector
//! - DataVector / ProcessedVector: stored and to-be-stored vectors
//! - DerivedVectorView: analysis-ready value object served to callers
//! - BioAssaySet: an experiment or an experiment subset
//! - Error: Error type hierarchy
//! - VectorStore: the persistence collaborator contract

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dimension;
pub mod error;
pub mod experiment;
pub mod limits;
pub mod quantitation;
pub mod traits;
pub mod types;
pub mod vector;
pub mod view;

pub use dimension::{BioAssay, BioAssayDimension};
pub use error::{Error, Result};
pub use experiment::{ArrayDesign, BioAssaySet, ExperimentSubset, TechnologyType, VectorOwner};
pub use quantitation::{
    GeneralQuantitationType, PrimitiveType, QuantitationType, ScaleType, StandardQuantitationType,
};
pub use traits::{PersistedGeneration, ProbeGeneMap, VectorStore};
pub use types::{
    ArrayDesignId, BioAssayId, BioMaterialId, DesignElementId, DimensionId, ExperimentId, GeneId,
    QuantitationTypeId, SubsetId, VectorId,
};
pub use vector::{DataVector, Payload, ProcessedVector, VectorKind};
pub use view::{DerivedVectorView, ViewKey};
