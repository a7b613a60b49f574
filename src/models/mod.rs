//! Data models for currencies and conversion rates.
//!
//! This module contains the domain types shared across the application:
//!
//! - `Currency`: a currency with its code, display name, and opaque details
//! - `ConversionRate`: a directional rate keyed "{FROM}_{TO}"
//! - The wire-format response types for the rate service
//! - Pair-identifier construction and the conversion arithmetic

pub mod currency;
pub mod rate;

pub use currency::{CountriesResponse, Currency};
pub use rate::{convert, pair_id, ConversionRate, ConvertResponse, EditedField};
