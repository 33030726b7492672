//! Ory Keto backend for snapkeep.
//!
//! [`KetoConnector`] implements [`snapkeep_core::store::TupleStore`] over
//! Keto's REST API, with one HTTP client for the write endpoint and another
//! for the read endpoint.

mod connector;
mod encode;

pub mod error;

pub use connector::{KetoConfig, KetoConnector};
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
