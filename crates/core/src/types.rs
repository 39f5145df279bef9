//! Identifier types
//!
//! Every entity the engine touches is persisted by an external store and
//! referred to by the numeric id that store assigned. Each entity kind gets
//! its own newtype so a gene id can never be passed where a probe id is
//! expected:
//! - ExperimentId / SubsetId: the bioassay sets vectors belong to
//! - DesignElementId: a probe on an assay platform
//! - GeneId: a gene a probe is associated with
//! - BioAssayId / BioMaterialId: a measurement run and the sample it measured
//! - DimensionId: a persisted bioassay dimension
//! - QuantitationTypeId, VectorId, ArrayDesignId

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw store id
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw store id
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of an expression experiment
    ExperimentId,
    "ee"
);

define_id!(
    /// Identifier of an experiment subset (a named selection of an experiment's bioassays)
    SubsetId,
    "subset"
);

define_id!(
    /// Identifier of a design element (probe)
    DesignElementId,
    "probe"
);

define_id!(
    /// Identifier of a gene
    GeneId,
    "gene"
);

define_id!(
    /// Identifier of a bioassay (one sample's measurement run)
    BioAssayId,
    "ba"
);

define_id!(
    /// Identifier of a biomaterial (the physical sample a bioassay measured)
    BioMaterialId,
    "bm"
);

define_id!(
    /// Identifier of a persisted bioassay dimension
    DimensionId,
    "bad"
);

define_id!(
    /// Identifier of a persisted quantitation type
    QuantitationTypeId,
    "qt"
);

define_id!(
    /// Identifier of a persisted data vector
    VectorId,
    "vec"
);

define_id!(
    /// Identifier of an array design (platform)
    ArrayDesignId,
    "ad"
);
