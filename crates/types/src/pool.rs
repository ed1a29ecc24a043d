//! Static pool configuration and the tick-range presets probed per pool

use alloy_primitives::{Address, B256};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_TICK_I24, MIN_TICK_I24};
use crate::errors::{ScoutError, ScoutResult};

// ============================================================================
// Tick Ranges
// ============================================================================

/// A (tick_lower, tick_upper) pair inside the int24 domain with lower < upper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i32; 2]", into = "[i32; 2]")]
pub struct TickRangePreset {
    tick_lower: i32,
    tick_upper: i32,
}

impl TickRangePreset {
    /// Create a preset, rejecting ticks outside int24 or an empty/inverted range
    pub fn new(tick_lower: i32, tick_upper: i32) -> ScoutResult<Self> {
        check_tick("tick_lower", tick_lower)?;
        check_tick("tick_upper", tick_upper)?;
        if tick_lower >= tick_upper {
            return Err(ScoutError::encoding(
                "tick_range",
                &format!("tick_lower {} must be below tick_upper {}", tick_lower, tick_upper),
            ));
        }
        Ok(Self { tick_lower, tick_upper })
    }

    pub fn tick_lower(&self) -> i32 {
        self.tick_lower
    }

    pub fn tick_upper(&self) -> i32 {
        self.tick_upper
    }

    /// Whether both bounds are multiples of the pool's tick spacing
    pub fn is_aligned(&self, tick_spacing: u32) -> bool {
        if tick_spacing == 0 {
            return false;
        }
        let spacing = tick_spacing as i64;
        (self.tick_lower as i64) % spacing == 0 && (self.tick_upper as i64) % spacing == 0
    }
}

impl TryFrom<[i32; 2]> for TickRangePreset {
    type Error = ScoutError;

    fn try_from(value: [i32; 2]) -> ScoutResult<Self> {
        Self::new(value[0], value[1])
    }
}

impl From<TickRangePreset> for [i32; 2] {
    fn from(value: TickRangePreset) -> Self {
        [value.tick_lower, value.tick_upper]
    }
}

/// Check that a tick fits the remote int24 type
pub fn check_tick(field: &str, tick: i32) -> ScoutResult<()> {
    if !(MIN_TICK_I24..=MAX_TICK_I24).contains(&tick) {
        return Err(ScoutError::encoding(
            field,
            &format!("{} not in int24 range [{}, {}]", tick, MIN_TICK_I24, MAX_TICK_I24),
        ));
    }
    Ok(())
}

// ============================================================================
// Pool Descriptor
// ============================================================================

/// On-chain pool metadata read from the pool's hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMeta {
    /// Maturity as unix seconds
    pub maturity: u64,
    pub total_liquidity: u128,
    pub frozen: bool,
}

/// Static record describing one pool and the hook that stores its positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolDescriptor {
    pub pool_id: B256,

    /// Remote program instance answering position reads for this pool
    pub hook_address: Address,

    /// Display name; derived from the symbols when empty
    #[serde(default)]
    pub name: String,

    pub token0_symbol: String,
    pub token1_symbol: String,

    /// Maturity as unix seconds
    pub maturity_timestamp: i64,

    pub tick_spacing: u32,

    /// Indicative yield supplied by an external estimator, in percent
    #[serde(default)]
    pub indicative_apy: Option<f64>,

    /// Filled at startup from the hook, never from the config file
    #[serde(skip)]
    pub meta: Option<PoolMeta>,
}

impl PoolDescriptor {
    /// Name shown to users
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("{}/{}", self.token0_symbol, self.token1_symbol)
        } else {
            self.name.clone()
        }
    }

    /// Maturity as a UTC datetime
    pub fn maturity_date(&self) -> ScoutResult<DateTime<Utc>> {
        Utc.timestamp_opt(self.maturity_timestamp, 0)
            .single()
            .ok_or_else(|| {
                ScoutError::invalid_configuration(
                    "pool.maturity_timestamp",
                    &format!("{} is not a valid unix timestamp", self.maturity_timestamp),
                )
            })
    }

    /// Whether the pool has reached maturity at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.maturity_timestamp
    }

    /// Whether the on-chain metadata marks the pool as frozen
    pub fn is_frozen(&self) -> bool {
        self.meta.map(|m| m.frozen).unwrap_or(false)
    }

    /// Attach on-chain metadata; the on-chain maturity wins over the configured one.
    ///
    /// Returns whether the maturity changed. Metadata whose maturity is not a
    /// representable date is rejected and the pool is left untouched.
    pub fn apply_meta(&mut self, meta: PoolMeta) -> ScoutResult<bool> {
        let maturity = i64::try_from(meta.maturity)
            .ok()
            .filter(|ts| Utc.timestamp_opt(*ts, 0).single().is_some())
            .ok_or_else(|| {
                ScoutError::decode(&format!(
                    "pool {} reports maturity {} outside the supported date range",
                    self.pool_id, meta.maturity
                ))
            })?;

        let changed = self.maturity_timestamp != maturity;
        self.maturity_timestamp = maturity;
        self.meta = Some(meta);
        Ok(changed)
    }

    /// Validate a configured pool
    pub fn validate(&self) -> ScoutResult<()> {
        if self.tick_spacing == 0 {
            return Err(ScoutError::invalid_configuration(
                "pool.tick_spacing",
                &format!("pool {} has zero tick spacing", self.pool_id),
            ));
        }
        if self.hook_address == Address::ZERO {
            return Err(ScoutError::invalid_configuration(
                "pool.hook_address",
                &format!("pool {} has no hook address", self.pool_id),
            ));
        }
        if self.token0_symbol.is_empty() || self.token1_symbol.is_empty() {
            return Err(ScoutError::invalid_configuration(
                "pool.token_symbols",
                &format!("pool {} is missing a token symbol", self.pool_id),
            ));
        }
        if let Some(apy) = self.indicative_apy {
            if !apy.is_finite() {
                return Err(ScoutError::invalid_configuration(
                    "pool.indicative_apy",
                    &format!("pool {} has a non-finite apy", self.pool_id),
                ));
            }
        }
        self.maturity_date()?;
        Ok(())
    }
}
