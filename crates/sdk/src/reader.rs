//! Port to the remote ledger: keyed position reads and pool metadata

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use scout_types::{PoolMeta, RawPositionRecord, ScoutResult};

/// Read-only surface exposed by each pool hook
#[async_trait]
pub trait PositionReader: Send + Sync {
    /// Read the records stored under `keys` on `hook`, index-aligned with `keys`.
    ///
    /// An `Err` means the whole instance could not be read; an individual
    /// missing record is `None`.
    async fn read_positions(
        &self,
        hook: Address,
        keys: &[B256],
    ) -> ScoutResult<Vec<Option<RawPositionRecord>>>;

    /// Read pool metadata from the pool's hook
    async fn read_pool_meta(&self, hook: Address, pool_id: B256) -> ScoutResult<PoolMeta>;
}
