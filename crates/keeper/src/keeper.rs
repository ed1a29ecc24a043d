use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use scout_core::{NoYield, PoolApyTable, YieldSource};
use scout_sdk::{enrich_pools, BatchQueryEngine, JsonRpcClient, PositionReader, RpcPositionReader};
use scout_types::ScoutResult;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{ScoutConfig, YieldSourceKind};
use crate::tracker::{PositionTracker, RefreshOutcome, TrackerSettings};

/// Counts from one pass over every tracked owner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub published: usize,
    pub stale: usize,
    pub coverage_gaps: usize,
}

/// Polling service that keeps the tracker fresh for every configured owner
pub struct Keeper {
    config: ScoutConfig,
    tracker: Arc<PositionTracker>,
}

impl Keeper {
    /// Build a keeper reading over JSON-RPC
    pub async fn connect(config: ScoutConfig) -> ScoutResult<Self> {
        let timeout = config.instance_timeout();
        let client = JsonRpcClient::new(&config.rpc_url, timeout, timeout)?;
        let reader = RpcPositionReader::new(client).with_block_tag(&config.block_tag);
        Ok(Self::start(config, Arc::new(reader)).await)
    }

    /// Build a keeper over any reader, enriching the pool table first if configured
    pub async fn start(mut config: ScoutConfig, reader: Arc<dyn PositionReader>) -> Self {
        if config.enrich_pools {
            let timeout = config.instance_timeout();
            let enriched = enrich_pools(reader.as_ref(), &mut config.pools, timeout).await;
            info!(enriched, pools = config.pools.len(), "Pool metadata loaded");
        }

        let yields: Arc<dyn YieldSource> = match config.yield_source {
            YieldSourceKind::PoolTable => Arc::new(PoolApyTable),
            YieldSourceKind::None => Arc::new(NoYield),
        };

        let expected_min_positions: HashMap<_, _> = config
            .owners
            .iter()
            .filter_map(|o| o.expected_min_positions.map(|n| (o.address, n)))
            .collect();

        let settings = TrackerSettings {
            pools: config.pools.clone(),
            presets: config.tick_range_presets.clone(),
            salts: config.salts.clone(),
            display_decimals: config.display_decimals,
            yields,
            expected_min_positions,
        };
        let engine = BatchQueryEngine::new(reader, config.instance_timeout());

        Self {
            config,
            tracker: Arc::new(PositionTracker::new(engine, settings)),
        }
    }

    pub fn tracker(&self) -> &Arc<PositionTracker> {
        &self.tracker
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Refresh every configured owner once
    pub async fn refresh_all(&self) -> PassReport {
        let mut report = PassReport::default();

        for owner in &self.config.owners {
            match self.tracker.refresh(owner.address).await {
                Ok(RefreshOutcome::Published { coverage_gap, .. }) => {
                    report.published += 1;
                    if coverage_gap {
                        report.coverage_gaps += 1;
                    }
                    let stats = self.tracker.aggregate_stats(owner.address);
                    debug!(
                        owner = %owner.address,
                        label = %owner.label,
                        positions = stats.position_count,
                        liquidity = stats.total_liquidity_value,
                        fees = stats.total_fees_earned,
                        apy = stats.average_apy,
                        "Owner refreshed"
                    );
                }
                Ok(RefreshOutcome::StaleRetained { .. }) => report.stale += 1,
                Err(e) => {
                    error!(owner = %owner.address, "Failed to refresh owner: {}", e);
                    report.stale += 1;
                }
            }
        }

        report
    }

    /// Poll until `shutdown` resolves; an in-flight pass is abandoned
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        let mut interval_timer = time::interval(self.config.poll_interval());
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut iteration = 0u64;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down keeper");
                    break;
                }
                _ = interval_timer.tick() => {}
            }

            iteration += 1;
            debug!("Starting keeper iteration {}", iteration);

            let report = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down keeper during iteration {}", iteration);
                    break;
                }
                report = self.refresh_all() => report,
            };

            if report.stale > 0 {
                warn!(
                    iteration,
                    published = report.published,
                    stale = report.stale,
                    "Some owners kept stale positions"
                );
            } else {
                info!(iteration, published = report.published, "Iteration complete");
            }
        }
    }
}
