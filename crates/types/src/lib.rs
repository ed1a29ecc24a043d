//! Shared types for position-scout
//!
//! This crate provides the identifiers, pool and position records, constants
//! and error taxonomy used by the encoder, the query engine and the keeper.

pub mod constants;
pub mod errors;
pub mod pool;
pub mod position;

// Re-export all public types
pub use constants::*;
pub use errors::*;
pub use pool::*;
pub use position::*;

pub use alloy_primitives::{Address, B256, I256, U256};
