//! # Scout Core - Position Discovery Logic
//!
//! Pure, synchronous building blocks of a discovery pass:
//!
//! - [`encoder`]: derives the storage key of a position
//! - [`candidates`]: enumerates the pool x tick-range x salt slots to probe
//! - [`reconcile`]: joins query results back into positions and totals
//!
//! Nothing here performs I/O; the query engine lives in `scout-sdk`.

pub mod candidates;
pub mod encoder;
pub mod reconcile;

// Re-export commonly used items
pub use candidates::{candidate_space_size, collect_candidates, generate_candidates};
pub use encoder::{derive_key, derive_key_from_slices, encode_signed_word, key_preimage};
pub use reconcile::{
    aggregate, reconcile, to_display_units, NoYield, PoolApyTable, ReconcileContext,
    Reconciliation, YieldSource,
};
