//! # Position Reconciler
//!
//! Joins query results back to the candidates they were issued for, keeps
//! the non-empty ones as [`LPPosition`]s and computes portfolio totals.
//! Pure: the clock and the yield collaborator are passed in, so the same
//! inputs always produce the same output.

use alloy_primitives::{B256, U256};
use chrono::{DateTime, Utc};
use scout_types::{
    AggregateStats, CandidateKey, LPPosition, PoolDescriptor, RawPositionRecord, ScoutError,
    ScoutResult, TickRangePreset,
};

// ============================================================================
// Yield Collaborator
// ============================================================================

/// Supplies the per-position yield that the reconciler averages
pub trait YieldSource: Send + Sync {
    /// Annualised yield for one position, in percent
    fn position_apy(&self, pool: &PoolDescriptor, position: &LPPosition) -> f64;
}

/// Reports zero yield for every position
#[derive(Debug, Clone, Copy, Default)]
pub struct NoYield;

impl YieldSource for NoYield {
    fn position_apy(&self, _pool: &PoolDescriptor, _position: &LPPosition) -> f64 {
        0.0
    }
}

/// Uses the indicative APY configured on each pool
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolApyTable;

impl YieldSource for PoolApyTable {
    fn position_apy(&self, pool: &PoolDescriptor, _position: &LPPosition) -> f64 {
        pool.indicative_apy.unwrap_or(0.0)
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Everything a reconciliation pass joins against
pub struct ReconcileContext<'a> {
    pub pools: &'a [PoolDescriptor],
    pub presets: &'a [TickRangePreset],
    pub salts: &'a [B256],
    pub now: DateTime<Utc>,
    pub display_decimals: u8,
    pub yields: &'a dyn YieldSource,
}

/// Positions found in one pass and their totals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub positions: Vec<LPPosition>,
    pub totals: AggregateStats,
}

/// Turn index-aligned query results into positions and totals
pub fn reconcile(
    candidates: &[CandidateKey],
    results: &[Option<RawPositionRecord>],
    ctx: &ReconcileContext<'_>,
) -> ScoutResult<Reconciliation> {
    if candidates.len() != results.len() {
        return Err(ScoutError::reconcile(&format!(
            "{} candidates but {} results",
            candidates.len(),
            results.len()
        )));
    }

    let mut positions = Vec::new();
    let mut apys = Vec::new();

    for (candidate, result) in candidates.iter().zip(results) {
        let Some(record) = result else { continue };
        if record.is_empty() {
            continue;
        }

        let pool = ctx.pools.get(candidate.pool_index).ok_or_else(|| {
            ScoutError::reconcile(&format!("unknown pool index {}", candidate.pool_index))
        })?;
        let preset = ctx.presets.get(candidate.tick_range_index).ok_or_else(|| {
            ScoutError::reconcile(&format!("unknown tick range index {}", candidate.tick_range_index))
        })?;
        let salt = ctx.salts.get(candidate.salt_index).ok_or_else(|| {
            ScoutError::reconcile(&format!("unknown salt index {}", candidate.salt_index))
        })?;

        let position = LPPosition {
            pool_id: pool.pool_id,
            pool_name: pool.display_name(),
            liquidity: record.liquidity,
            fees_earned: record.fees_earned(),
            tick_lower: preset.tick_lower(),
            tick_upper: preset.tick_upper(),
            token0_symbol: pool.token0_symbol.clone(),
            token1_symbol: pool.token1_symbol.clone(),
            maturity_date: pool.maturity_date()?,
            is_expired: pool.is_expired_at(ctx.now),
            salt: *salt,
        };

        apys.push(ctx.yields.position_apy(pool, &position));
        positions.push(position);
    }

    let totals = aggregate(&positions, &apys, ctx.display_decimals);
    Ok(Reconciliation { positions, totals })
}

/// Portfolio totals; `apys` is index-aligned with `positions`
pub fn aggregate(positions: &[LPPosition], apys: &[f64], display_decimals: u8) -> AggregateStats {
    let total_liquidity_value = positions
        .iter()
        .map(|p| to_display_units(p.liquidity, display_decimals))
        .sum();
    let total_fees_earned = positions
        .iter()
        .map(|p| to_display_units(p.fees_earned, display_decimals))
        .sum();
    let average_apy = if positions.is_empty() {
        0.0
    } else {
        apys.iter().sum::<f64>() / positions.len() as f64
    };

    AggregateStats {
        total_liquidity_value,
        total_fees_earned,
        average_apy,
        position_count: positions.len(),
    }
}

/// Convert a raw 256-bit amount to display units with the given decimals
pub fn to_display_units(value: U256, decimals: u8) -> f64 {
    let raw = value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0f64, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64);
    raw / 10f64.powi(decimals as i32)
}
