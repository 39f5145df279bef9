//! Error types for exprvec
//!
//! This module defines all error types used throughout the engine.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Mask/data length disagreements are not errors: they are recovered
//! locally and reported through the processing summary.

use crate::quantitation::PrimitiveType;
use crate::types::{ArrayDesignId, DesignElementId, ExperimentId, VectorId};
use std::io;
use thiserror::Error;

/// Result type alias for exprvec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the processed vector engine
#[derive(Debug, Error)]
pub enum Error {
    /// Recomputation requested but the experiment has no preferred raw vectors
    #[error("No preferred data vectors for {experiment}")]
    NoPreferredData {
        /// Experiment being processed
        experiment: ExperimentId,
    },

    /// The same design element appears twice among the preferred vectors
    #[error(
        "Duplicated design element {design_element} in {experiment}; make sure the experiment \
         has only one preferred quantitation type"
    )]
    DuplicateDesignElement {
        /// Experiment being processed
        experiment: ExperimentId,
        /// The repeated design element
        design_element: DesignElementId,
    },

    /// A platform has no technology type, so two-channel masking cannot be decided
    #[error("Array design {array_design} used by {experiment} has no technology type assigned")]
    MissingTechnologyType {
        /// Experiment being processed
        experiment: ExperimentId,
        /// Platform lacking the classification
        array_design: ArrayDesignId,
    },

    /// A vector does not hold the primitive representation the operation needs
    #[error("Vector {vector} has representation {actual:?}, expected {expected:?}")]
    UnsupportedRepresentation {
        /// Offending vector
        vector: VectorId,
        /// Representation required
        expected: PrimitiveType,
        /// Representation found
        actual: PrimitiveType,
    },

    /// A vector's payload length disagrees with its bioassay dimension
    #[error("Vector {vector} has {actual} values but its dimension has {expected} bioassays")]
    PayloadLengthMismatch {
        /// Offending vector
        vector: VectorId,
        /// Dimension length
        expected: usize,
        /// Payload length
        actual: usize,
    },

    /// A replacement generation was supplied without any vectors
    #[error("Cannot install an empty processed vector set for {experiment}")]
    EmptyVectorSet {
        /// Experiment being processed
        experiment: ExperimentId,
    },

    /// Stored bytes could not be decoded
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// The vector store failed
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration is invalid or unreadable
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Build a store error from anything displayable
    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }

    /// Build a configuration error from anything displayable
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Check if this error signals an upstream data-integrity problem
    ///
    /// Integrity errors abort recomputation and are not retried.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            Error::NoPreferredData { .. }
                | Error::DuplicateDesignElement { .. }
                | Error::MissingTechnologyType { .. }
                | Error::UnsupportedRepresentation { .. }
                | Error::PayloadLengthMismatch { .. }
        )
    }

    /// Check if this error came from the vector store
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Corruption(_))
    }
}
