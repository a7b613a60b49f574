//! Versioned cache of static application assets.
//!
//! This module provides the `AssetCache`, which pre-populates a named,
//! versioned bucket at install time, garbage-collects stale buckets on
//! activation, and serves intercepted requests cache-first. Traffic to
//! the rate service always bypasses the cache.

pub mod cache;

pub use cache::{AssetCache, CachedAsset, ServeDecision, ASSET_MANIFEST, BUCKET_VERSION};
