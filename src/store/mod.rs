//! Local persistent storage for offline data access.
//!
//! This module provides the `StoreManager` for storing and retrieving
//! currencies and conversion rates locally. Data is kept in JSON format,
//! one file per collection:
//!
//! - Currencies, keyed by code, replaced wholesale on every refresh
//! - Conversion rates, keyed by pair id, upserted individually

pub mod manager;

pub use manager::StoreManager;
