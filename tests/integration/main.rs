//! Integration Tests
//!
//! End-to-end tests through the public facade, organized by concern:
//! - scenarios: recomputation, masking, alignment, invalidation, slicing
//! - read_path: gene and probe reads, subsets, caching behaviour
//! - ranks: rank accessors over persisted ranks
//! - failures: store errors and how they propagate
//! - config: TOML configuration driving the engine
//! - concurrency: readers and writers sharing one engine

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod config;
mod failures;
mod ranks;
mod read_path;
mod scenarios;
