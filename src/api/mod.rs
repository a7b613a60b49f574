//! REST API client module for the remote conversion rate service.
//!
//! This module provides the `ApiClient` for fetching the currency list
//! and pairwise conversion rates, behind the `RateService` trait so the
//! sync coordinator can be driven by test doubles.
//!
//! The API requires no authentication; every endpoint is a plain GET.

pub mod client;
pub mod error;

pub use client::{ApiClient, RateService, DEFAULT_API_URL};
pub use error::ApiError;
