//! Constants shared by the encoder, the query engine and the keeper

use alloy_primitives::B256;

// ============================================================================
// Encoding Constants
// ============================================================================

/// Width of one ABI word in bytes
pub const WORD_SIZE: usize = 32;

/// Number of words hashed into a position key (owner, pool, lower, upper, salt)
pub const KEY_PREIMAGE_WORDS: usize = 5;

/// Length of the position key pre-image in bytes
pub const KEY_PREIMAGE_LEN: usize = WORD_SIZE * KEY_PREIMAGE_WORDS;

// ============================================================================
// Tick Constants
// ============================================================================

/// Smallest value representable by the remote int24 tick type
pub const MIN_TICK_I24: i32 = -(1 << 23);

/// Largest value representable by the remote int24 tick type
pub const MAX_TICK_I24: i32 = (1 << 23) - 1;

/// Tick-range presets probed for every pool unless configured otherwise
pub const DEFAULT_TICK_RANGE_PRESETS: [(i32, i32); 5] = [
    (-23_040, 23_040),
    (-887_220, 887_220),
    (-46_080, 46_080),
    (-11_520, 11_520),
    (-6_960, 6_960),
];

// ============================================================================
// Salt Constants
// ============================================================================

/// Salt used by the periphery when the caller does not supply one
pub const ZERO_SALT: B256 = B256::ZERO;

/// Salts probed for every (pool, preset) pair unless configured otherwise
pub fn default_salts() -> Vec<B256> {
    vec![ZERO_SALT, B256::with_last_byte(1)]
}

// ============================================================================
// Discovery Limits
// ============================================================================

/// Upper bound on |pools| x |presets| x |salts| for a single discovery pass
pub const MAX_CANDIDATES: usize = 512;

/// Decimals used to convert raw liquidity and funding into display units
pub const DEFAULT_DISPLAY_DECIMALS: u8 = 18;

/// Largest accepted display decimals (10^38 still fits the f64 exponent range comfortably)
pub const MAX_DISPLAY_DECIMALS: u8 = 38;

// ============================================================================
// Service Defaults
// ============================================================================

/// Default polling interval between refresh cycles (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default timeout applied to each remote instance per cycle (milliseconds)
pub const DEFAULT_INSTANCE_TIMEOUT_MS: u64 = 10_000;
