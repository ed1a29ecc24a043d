//! # Position Tracker
//!
//! Per-owner cache of discovered positions and the refresh cycle that
//! fills it. One cycle runs at a time. A cycle that fails anywhere keeps
//! the previously published snapshot and marks it as stale. Publication
//! is a single synchronous write after the last await, so dropping a
//! refresh future mid-cycle leaves the cache untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use scout_core::{collect_candidates, reconcile, ReconcileContext, Reconciliation, YieldSource};
use scout_sdk::BatchQueryEngine;
use scout_types::{
    AggregateStats, LPPosition, PoolDescriptor, ScoutError, ScoutResult, TickRangePreset,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Phase of the refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Deriving { owner: Address },
    Querying { owner: Address },
    Reconciling { owner: Address },
    Published { owner: Address },
    StaleRetained { owner: Address },
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleState::Idle => write!(f, "idle"),
            CycleState::Deriving { .. } => write!(f, "deriving"),
            CycleState::Querying { .. } => write!(f, "querying"),
            CycleState::Reconciling { .. } => write!(f, "reconciling"),
            CycleState::Published { .. } => write!(f, "published"),
            CycleState::StaleRetained { .. } => write!(f, "stale_retained"),
        }
    }
}

/// Result of one refresh cycle
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Fresh data replaced the snapshot
    Published {
        position_count: usize,
        coverage_gap: bool,
    },
    /// The cycle failed; the previous snapshot stays visible
    StaleRetained { reason: ScoutError },
}

impl RefreshOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, RefreshOutcome::Published { .. })
    }
}

/// What readers see for one owner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerSnapshot {
    pub positions: Vec<LPPosition>,
    pub totals: AggregateStats,
    pub last_refresh_succeeded: bool,
    /// When `positions` were last published
    pub refreshed_at: Option<DateTime<Utc>>,
    /// A successful cycle found fewer positions than the owner is known to hold
    pub coverage_gap: bool,
    /// Reason of the most recent failed cycle, cleared on success
    pub last_error: Option<ScoutError>,
}

/// Static inputs to every discovery pass
#[derive(Clone)]
pub struct TrackerSettings {
    pub pools: Vec<PoolDescriptor>,
    pub presets: Vec<TickRangePreset>,
    pub salts: Vec<B256>,
    pub display_decimals: u8,
    pub yields: Arc<dyn YieldSource>,
    /// Minimum position count per owner, when known from other sources
    pub expected_min_positions: HashMap<Address, usize>,
}

/// Resets the published state to `Idle` when a cycle ends, including by cancellation
struct StateGuard<'a> {
    state: &'a watch::Sender<CycleState>,
}

impl<'a> StateGuard<'a> {
    fn enter(state: &'a watch::Sender<CycleState>, phase: CycleState) -> Self {
        state.send_replace(phase);
        Self { state }
    }

    fn set(&self, phase: CycleState) {
        debug!(%phase, "Refresh cycle phase");
        self.state.send_replace(phase);
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.state.send_replace(CycleState::Idle);
    }
}

/// Cache of discovered positions per owner
pub struct PositionTracker {
    engine: BatchQueryEngine,
    settings: TrackerSettings,
    snapshots: RwLock<HashMap<Address, OwnerSnapshot>>,
    cycle: Mutex<()>,
    state: watch::Sender<CycleState>,
}

impl PositionTracker {
    pub fn new(engine: BatchQueryEngine, settings: TrackerSettings) -> Self {
        let (state, _) = watch::channel(CycleState::Idle);
        Self {
            engine,
            settings,
            snapshots: RwLock::new(HashMap::new()),
            cycle: Mutex::new(()),
            state,
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Last published positions; empty for an owner never refreshed successfully
    pub fn positions(&self, owner: Address) -> Vec<LPPosition> {
        self.read_snapshot(owner, |s| s.positions.clone()).unwrap_or_default()
    }

    pub fn aggregate_stats(&self, owner: Address) -> AggregateStats {
        self.read_snapshot(owner, |s| s.totals).unwrap_or_default()
    }

    pub fn last_refresh_succeeded(&self, owner: Address) -> bool {
        self.read_snapshot(owner, |s| s.last_refresh_succeeded).unwrap_or(false)
    }

    pub fn snapshot(&self, owner: Address) -> Option<OwnerSnapshot> {
        self.read_snapshot(owner, OwnerSnapshot::clone)
    }

    /// Watch the cycle phase
    pub fn subscribe_state(&self) -> watch::Receiver<CycleState> {
        self.state.subscribe()
    }

    /// Current cycle phase
    pub fn state(&self) -> CycleState {
        *self.state.borrow()
    }

    /// Run one discovery cycle for `owner`, waiting for any cycle in flight
    pub async fn refresh(&self, owner: Address) -> ScoutResult<RefreshOutcome> {
        if owner == Address::ZERO {
            return Err(ScoutError::invalid_configuration("owner", "zero address cannot own positions"));
        }

        let _cycle = self.cycle.lock().await;
        let guard = StateGuard::enter(&self.state, CycleState::Deriving { owner });

        let settings = &self.settings;
        let candidates = collect_candidates(owner, &settings.pools, &settings.presets, &settings.salts);

        guard.set(CycleState::Querying { owner });
        let results = match self.engine.batch_query(&candidates, &settings.pools).await {
            Ok(results) => results,
            Err(error) => return Ok(self.retain_stale(&guard, owner, error)),
        };

        guard.set(CycleState::Reconciling { owner });
        let ctx = ReconcileContext {
            pools: &settings.pools,
            presets: &settings.presets,
            salts: &settings.salts,
            now: Utc::now(),
            display_decimals: settings.display_decimals,
            yields: settings.yields.as_ref(),
        };
        match reconcile(&candidates, &results, &ctx) {
            Ok(reconciliation) => Ok(self.publish(&guard, owner, reconciliation, ctx.now)),
            Err(error) => Ok(self.retain_stale(&guard, owner, error)),
        }
    }

    fn publish(
        &self,
        guard: &StateGuard<'_>,
        owner: Address,
        reconciliation: Reconciliation,
        now: DateTime<Utc>,
    ) -> RefreshOutcome {
        let position_count = reconciliation.positions.len();
        let coverage_gap = match self.settings.expected_min_positions.get(&owner) {
            Some(&expected) if position_count < expected => {
                warn!(
                    %owner,
                    found = position_count,
                    expected,
                    "Owner holds positions outside the probed tick ranges and salts"
                );
                true
            }
            _ => false,
        };

        let snapshot = OwnerSnapshot {
            positions: reconciliation.positions,
            totals: reconciliation.totals,
            last_refresh_succeeded: true,
            refreshed_at: Some(now),
            coverage_gap,
            last_error: None,
        };
        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(owner, snapshot);

        guard.set(CycleState::Published { owner });
        info!(%owner, positions = position_count, "Published positions");

        RefreshOutcome::Published {
            position_count,
            coverage_gap,
        }
    }

    fn retain_stale(&self, guard: &StateGuard<'_>, owner: Address, error: ScoutError) -> RefreshOutcome {
        {
            let mut snapshots = self.snapshots.write().unwrap_or_else(PoisonError::into_inner);
            let snapshot = snapshots.entry(owner).or_default();
            snapshot.last_refresh_succeeded = false;
            snapshot.last_error = Some(error.clone());
        }

        guard.set(CycleState::StaleRetained { owner });
        warn!(%owner, %error, "Refresh failed, keeping previous positions");

        RefreshOutcome::StaleRetained { reason: error }
    }

    fn read_snapshot<T>(&self, owner: Address, f: impl FnOnce(&OwnerSnapshot) -> T) -> Option<T> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&owner)
            .map(f)
    }
}
