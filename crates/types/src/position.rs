//! Position records as read from the hook and as published to callers

use alloy_primitives::{B256, I256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Discovery Records
// ============================================================================

/// One probed slot: the derived key plus the indices it was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    pub pool_index: usize,
    pub tick_range_index: usize,
    pub salt_index: usize,
    pub key: B256,
}

/// Position record stored by the hook under a derived key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPositionRecord {
    pub liquidity: U256,
    pub funding_growth_snapshot: U256,
    /// Signed: negative when the position owes funding
    pub funding_owed: I256,
}

impl RawPositionRecord {
    /// Zero liquidity is treated exactly like an absent record
    pub fn is_empty(&self) -> bool {
        self.liquidity.is_zero()
    }

    /// Funding owed to the position, clamped at zero
    pub fn fees_earned(&self) -> U256 {
        if self.funding_owed.is_positive() {
            self.funding_owed.into_raw()
        } else {
            U256::ZERO
        }
    }
}

// ============================================================================
// Published Records
// ============================================================================

/// A discovered liquidity position joined back to its pool and tick range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LPPosition {
    pub pool_id: B256,
    pub pool_name: String,
    pub liquidity: U256,
    pub fees_earned: U256,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub token0_symbol: String,
    pub token1_symbol: String,
    pub maturity_date: DateTime<Utc>,
    pub is_expired: bool,
    pub salt: B256,
}

/// Portfolio totals over a set of positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Sum of liquidity in display units
    pub total_liquidity_value: f64,
    /// Sum of non-negative funding owed in display units
    pub total_fees_earned: f64,
    /// Mean per-position yield; zero without positions
    pub average_apy: f64,
    pub position_count: usize,
}
