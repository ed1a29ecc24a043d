//! Scout SDK
//!
//! Reads position records from pool hooks. Provides:
//! - the [`PositionReader`] port and its JSON-RPC implementation
//! - the [`BatchQueryEngine`], one concurrent round trip per hook
//! - startup enrichment of pool descriptors with on-chain metadata

pub mod abi;
pub mod batch;
pub mod pools;
pub mod reader;
pub mod rpc;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use batch::{group_by_instance, BatchQueryEngine, InstanceGroup};
pub use pools::enrich_pools;
pub use reader::PositionReader;
pub use rpc::{JsonRpcClient, RpcCall, RpcPositionReader};

// Re-export shared types
pub use scout_types::*;
