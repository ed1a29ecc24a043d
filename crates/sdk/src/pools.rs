//! Startup enrichment of the static pool table with on-chain metadata

use std::time::Duration;

use scout_types::PoolDescriptor;
use tracing::{info, warn};

use crate::reader::PositionReader;

/// Attach `PoolMeta` to each pool; failures are logged and leave the pool as configured
pub async fn enrich_pools(
    reader: &dyn PositionReader,
    pools: &mut [PoolDescriptor],
    timeout: Duration,
) -> usize {
    let mut enriched = 0;

    for pool in pools.iter_mut() {
        let read = reader.read_pool_meta(pool.hook_address, pool.pool_id);
        let meta = match tokio::time::timeout(timeout, read).await {
            Ok(Ok(meta)) => meta,
            Ok(Err(error)) => {
                warn!(pool = %pool.pool_id, %error, "Failed to read pool metadata");
                continue;
            }
            Err(_) => {
                warn!(pool = %pool.pool_id, "Timed out reading pool metadata");
                continue;
            }
        };

        let configured = pool.maturity_timestamp;
        match pool.apply_meta(meta) {
            Ok(true) => warn!(
                pool = %pool.pool_id,
                configured,
                on_chain = meta.maturity,
                "Configured maturity disagrees with the hook, using on-chain value"
            ),
            Ok(false) => {}
            Err(error) => {
                warn!(pool = %pool.pool_id, %error, "Ignoring pool metadata, keeping configured maturity");
                continue;
            }
        }
        if meta.frozen {
            info!(pool = %pool.pool_id, "Pool is frozen");
        }
        enriched += 1;
    }

    enriched
}
