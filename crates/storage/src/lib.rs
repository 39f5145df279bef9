//! Storage layer for exprvec
//!
//! This crate provides:
//! - DerivedVectorCache: the (experiment, gene) keyed derived-vector cache
//! - ShardedVectorCache: DashMap-sharded in-memory cache with epoch tokens
//! - InMemoryVectorStore: reference `VectorStore` with atomic generation replacement
//! - PayloadCodec: little-endian byte packing of vector payloads

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod codec;
pub mod memory;

pub use cache::{CacheStats, CacheToken, DerivedVectorCache, ShardedVectorCache};
pub use codec::PayloadCodec;
pub use memory::{InMemoryVectorStore, StoreStats};
