//! Quantitation types
//!
//! A quantitation type describes what the numbers in a vector mean: their
//! scale, their primitive representation, and whether they are the
//! experiment's preferred or masked-preferred data.
//!
//! Quantitation types are immutable once persisted. Recomputing processed
//! vectors always derives a fresh type via [`QuantitationType::derive_processed`]
//! rather than editing the source type in place.

use crate::types::QuantitationTypeId;
use serde::{Deserialize, Serialize};

/// Broad category of the quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneralQuantitationType {
    /// Continuous measurements
    Quantitative,
    /// Discrete calls (e.g. present/absent)
    Categorical,
}

/// The standard kind of measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardQuantitationType {
    /// Signal amount (intensity, expression level)
    Amount,
    /// Count data (e.g. sequencing read counts)
    Count,
    /// Presence/absence calls; used for missing-value indicator vectors
    PresentAbsent,
    /// Ratio of two channels
    Ratio,
    /// Correlation values
    Correlation,
    /// Anything else
    Other,
}

/// Scale the values are expressed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    /// Untransformed
    Linear,
    /// log base 2
    Log2,
    /// log base 10
    Log10,
    /// natural log
    Ln,
    /// Percentages
    Percent,
    /// Raw counts
    Count,
    /// Anything else
    Other,
}

/// Primitive representation of each element of a vector payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    /// 64-bit floating point
    Double,
    /// Integer
    Int,
    /// Boolean
    Boolean,
    /// Text
    String,
}

/// Metadata describing the semantic representation of a vector's values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitationType {
    /// Store-assigned id; `None` until persisted
    pub id: Option<QuantitationTypeId>,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Broad category
    pub general_type: GeneralQuantitationType,
    /// Kind of measurement
    pub standard_type: StandardQuantitationType,
    /// Scale of the values
    pub scale: ScaleType,
    /// Primitive representation of the payload
    pub representation: PrimitiveType,
    /// This is the experiment's preferred raw data
    pub is_preferred: bool,
    /// Values are two-channel ratios
    pub is_ratio: bool,
    /// Values were normalized upstream
    pub is_normalized: bool,
    /// Values are a background measurement
    pub is_background: bool,
    /// Background was subtracted from the values
    pub is_background_subtracted: bool,
    /// This is the masked (processed) version of the preferred data
    pub is_masked_preferred: bool,
    /// Values were recomputed from raw data files
    pub is_recomputed_from_raw_data: bool,
    /// Values were batch corrected
    pub is_batch_corrected: bool,
}

impl Default for QuantitationType {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            general_type: GeneralQuantitationType::Quantitative,
            standard_type: StandardQuantitationType::Amount,
            scale: ScaleType::Linear,
            representation: PrimitiveType::Double,
            is_preferred: false,
            is_ratio: false,
            is_normalized: false,
            is_background: false,
            is_background_subtracted: false,
            is_masked_preferred: false,
            is_recomputed_from_raw_data: false,
            is_batch_corrected: false,
        }
    }
}

impl QuantitationType {
    /// A preferred, double-valued quantitative type with the given name and scale
    pub fn preferred(name: impl Into<String>, scale: ScaleType) -> Self {
        Self {
            name: name.into(),
            scale,
            is_preferred: true,
            ..Self::default()
        }
    }

    /// A present/absent boolean type for missing-value indicator vectors
    pub fn present_absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            general_type: GeneralQuantitationType::Categorical,
            standard_type: StandardQuantitationType::PresentAbsent,
            scale: ScaleType::Other,
            representation: PrimitiveType::Boolean,
            ..Self::default()
        }
    }

    /// Whether this type holds count data
    pub fn is_count(&self) -> bool {
        self.standard_type == StandardQuantitationType::Count
    }

    /// Whether this type holds present/absent calls
    pub fn is_present_absent(&self) -> bool {
        self.standard_type == StandardQuantitationType::PresentAbsent
    }

    /// Derive the quantitation type for processed vectors computed from this one
    ///
    /// Representation, scale, ratio, normalization and background-subtraction
    /// flags are carried over. The result is never preferred, always
    /// masked-preferred, and has no id until the store persists it.
    pub fn derive_processed(&self) -> QuantitationType {
        QuantitationType {
            id: None,
            name: format!("{} - Processed data", self.name),
            description: "Processed data for analysis".to_string(),
            general_type: self.general_type,
            standard_type: self.standard_type,
            scale: self.scale,
            representation: self.representation,
            is_preferred: false,
            is_ratio: self.is_ratio,
            is_normalized: self.is_normalized,
            is_background: false,
            is_background_subtracted: self.is_background_subtracted,
            is_masked_preferred: true,
            is_recomputed_from_raw_data: self.is_recomputed_from_raw_data,
            is_batch_corrected: self.is_batch_corrected,
        }
    }
}
