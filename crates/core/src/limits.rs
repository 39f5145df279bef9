//! Engine limits and defaults
//!
//! These are the defaults behind `EngineConfig`; each can be overridden in
//! the engine's TOML configuration.

/// Quantile normalization is skipped unless the experiment has more
/// design-element vectors than this.
///
/// Small data sets are more likely to be harmed than helped by
/// renormalization, and keeping the threshold high bounds the cost of the
/// sort-heavy normalization step.
pub const MIN_SIZE_FOR_RENORMALIZATION: usize = 4000;

/// Number of probes sent to the store per fetch
pub const DEFAULT_FETCH_BATCH_SIZE: usize = 500;

/// Mask inconsistencies logged in detail per recomputation before the rest
/// are only counted
pub const DEFAULT_MASK_WARNING_LIMIT: usize = 5;

/// Progress is logged every this many built vectors
pub const BUILD_PROGRESS_INTERVAL: usize = 5000;
