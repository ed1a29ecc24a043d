use std::collections::HashSet;
use std::fs;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use scout_core::candidate_space_size;
use scout_types::{
    default_salts, PoolDescriptor, ScoutError, ScoutResult, TickRangePreset,
    DEFAULT_DISPLAY_DECIMALS, DEFAULT_INSTANCE_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_TICK_RANGE_PRESETS, MAX_CANDIDATES, MAX_DISPLAY_DECIMALS,
};
use tracing::warn;

/// Keeper configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoutConfig {
    /// EVM JSON-RPC endpoint
    pub rpc_url: String,

    /// Block tag used for reads
    #[serde(default = "default_block_tag")]
    pub block_tag: String,

    /// Interval between refresh cycles in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Budget for each remote instance per cycle in milliseconds
    #[serde(default = "default_instance_timeout_ms")]
    pub instance_timeout_ms: u64,

    /// Decimals used to convert raw amounts to display units
    #[serde(default = "default_display_decimals")]
    pub display_decimals: u8,

    /// Read pool metadata from the hooks at startup
    #[serde(default = "default_true")]
    pub enrich_pools: bool,

    /// Where per-position yield comes from
    #[serde(default)]
    pub yield_source: YieldSourceKind,

    /// Tick ranges probed for every pool
    #[serde(default = "default_presets")]
    pub tick_range_presets: Vec<TickRangePreset>,

    /// Salts probed for every (pool, tick range) pair
    #[serde(default = "default_salts")]
    pub salts: Vec<B256>,

    /// Accounts whose positions are tracked
    #[serde(default)]
    pub owners: Vec<OwnerConfig>,

    /// Static pool table
    pub pools: Vec<PoolDescriptor>,
}

/// A tracked account
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OwnerConfig {
    pub address: Address,

    /// Label for logging
    #[serde(default)]
    pub label: String,

    /// Positions the owner is known to hold by other means (e.g. event history)
    #[serde(default)]
    pub expected_min_positions: Option<usize>,
}

/// Source of per-position yield figures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldSourceKind {
    /// Indicative APY configured per pool
    #[default]
    PoolTable,
    /// Always zero
    None,
}

fn default_block_tag() -> String {
    "latest".to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_instance_timeout_ms() -> u64 {
    DEFAULT_INSTANCE_TIMEOUT_MS
}

fn default_display_decimals() -> u8 {
    DEFAULT_DISPLAY_DECIMALS
}

fn default_true() -> bool {
    true
}

/// The built-in tick-range presets
pub fn default_presets() -> Vec<TickRangePreset> {
    DEFAULT_TICK_RANGE_PRESETS
        .iter()
        .filter_map(|(lower, upper)| TickRangePreset::new(*lower, *upper).ok())
        .collect()
}

impl ScoutConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> ScoutResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScoutError::invalid_configuration("config", &format!("Failed to read config file {}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> ScoutResult<Self> {
        let config: ScoutConfig = toml::from_str(content).map_err(|e| {
            ScoutError::invalid_configuration("config", &format!("Failed to parse config: {}", e))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> ScoutResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            ScoutError::invalid_configuration("config", &format!("Failed to serialize config: {}", e))
        })?;
        fs::write(path, content).map_err(|e| {
            ScoutError::invalid_configuration("config", &format!("Failed to write config file {}: {}", path, e))
        })?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ScoutResult<()> {
        if self.rpc_url.is_empty() {
            return Err(ScoutError::invalid_configuration("rpc_url", "must not be empty"));
        }

        if self.poll_interval_secs == 0 {
            return Err(ScoutError::invalid_configuration("poll_interval_secs", "must be greater than 0"));
        }

        if self.instance_timeout_ms == 0 {
            return Err(ScoutError::invalid_configuration("instance_timeout_ms", "must be greater than 0"));
        }

        if self.instance_timeout_ms >= self.poll_interval_secs.saturating_mul(1_000) {
            return Err(ScoutError::invalid_configuration(
                "instance_timeout_ms",
                &format!(
                    "{}ms must be shorter than the poll interval ({}s)",
                    self.instance_timeout_ms, self.poll_interval_secs
                ),
            ));
        }

        if self.display_decimals > MAX_DISPLAY_DECIMALS {
            return Err(ScoutError::invalid_configuration(
                "display_decimals",
                &format!("{} exceeds {}", self.display_decimals, MAX_DISPLAY_DECIMALS),
            ));
        }

        if self.pools.is_empty() {
            return Err(ScoutError::invalid_configuration("pools", "at least one pool is required"));
        }

        if self.tick_range_presets.is_empty() {
            return Err(ScoutError::invalid_configuration("tick_range_presets", "at least one preset is required"));
        }

        if self.salts.is_empty() {
            return Err(ScoutError::invalid_configuration("salts", "at least one salt is required"));
        }

        let mut pool_ids = HashSet::new();
        for pool in &self.pools {
            pool.validate()?;
            if !pool_ids.insert(pool.pool_id) {
                return Err(ScoutError::invalid_configuration(
                    "pools",
                    &format!("duplicate pool id {}", pool.pool_id),
                ));
            }
            for preset in &self.tick_range_presets {
                if !preset.is_aligned(pool.tick_spacing) {
                    warn!(
                        pool = %pool.pool_id,
                        tick_lower = preset.tick_lower(),
                        tick_upper = preset.tick_upper(),
                        tick_spacing = pool.tick_spacing,
                        "Preset is not aligned to the pool's tick spacing and cannot hold a position"
                    );
                }
            }
        }

        let space = self.candidate_space();
        if space > MAX_CANDIDATES {
            return Err(ScoutError::invalid_configuration(
                "candidates",
                &format!(
                    "{} pools x {} presets x {} salts = {} candidates exceeds {}",
                    self.pools.len(),
                    self.tick_range_presets.len(),
                    self.salts.len(),
                    space,
                    MAX_CANDIDATES
                ),
            ));
        }

        let mut owners = HashSet::new();
        for owner in &self.owners {
            if owner.address == Address::ZERO {
                return Err(ScoutError::invalid_configuration("owners", "zero address cannot own positions"));
            }
            if !owners.insert(owner.address) {
                return Err(ScoutError::invalid_configuration(
                    "owners",
                    &format!("duplicate owner {}", owner.address),
                ));
            }
        }

        Ok(())
    }

    /// Candidates probed per owner per cycle
    pub fn candidate_space(&self) -> usize {
        candidate_space_size(self.pools.len(), self.tick_range_presets.len(), self.salts.len())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn instance_timeout(&self) -> Duration {
        Duration::from_millis(self.instance_timeout_ms)
    }
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            block_tag: default_block_tag(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            instance_timeout_ms: DEFAULT_INSTANCE_TIMEOUT_MS,
            display_decimals: DEFAULT_DISPLAY_DECIMALS,
            enrich_pools: true,
            yield_source: YieldSourceKind::default(),
            tick_range_presets: default_presets(),
            salts: default_salts(),
            owners: vec![],
            pools: vec![],
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: &str) -> ScoutResult<()> {
    let example_config = ScoutConfig {
        owners: vec![OwnerConfig {
            address: Address::repeat_byte(0xaa),
            label: "example".to_string(),
            expected_min_positions: None,
        }],
        pools: vec![PoolDescriptor {
            pool_id: B256::repeat_byte(0x01),
            hook_address: Address::repeat_byte(0x0b),
            name: "USDC/WETH Dec".to_string(),
            token0_symbol: "USDC".to_string(),
            token1_symbol: "WETH".to_string(),
            maturity_timestamp: 1_767_225_600,
            tick_spacing: 60,
            indicative_apy: Some(8.5),
            meta: None,
        }],
        ..ScoutConfig::default()
    };

    example_config.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL_ID: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";
    const HOOK: &str = "0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b";

    fn minimal_toml() -> String {
        format!(
            r#"
rpc_url = "http://localhost:8545"

[[owners]]
address = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
expected_min_positions = 1

[[pools]]
pool_id = "{POOL_ID}"
hook_address = "{HOOK}"
token0_symbol = "USDC"
token1_symbol = "WETH"
maturity_timestamp = 1767225600
tick_spacing = 60
"#
        )
    }

    fn valid_config() -> ScoutConfig {
        ScoutConfig::from_toml(&minimal_toml()).unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = valid_config();
        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert_eq!(config.instance_timeout_ms, DEFAULT_INSTANCE_TIMEOUT_MS);
        assert_eq!(config.block_tag, "latest");
        assert_eq!(config.tick_range_presets, default_presets());
        assert_eq!(config.salts, default_salts());
        assert_eq!(config.yield_source, YieldSourceKind::PoolTable);
        assert_eq!(config.owners[0].expected_min_positions, Some(1));
        assert_eq!(config.candidate_space(), 5 * 2);
    }

    #[test]
    fn test_explicit_presets_and_salts() {
        let toml = minimal_toml().replacen(
            "rpc_url = \"http://localhost:8545\"",
            "rpc_url = \"http://localhost:8545\"\ntick_range_presets = [[-600, 600]]\nsalts = [\"0x0000000000000000000000000000000000000000000000000000000000000007\"]\nyield_source = \"none\"",
            1,
        );
        let config = ScoutConfig::from_toml(&toml).unwrap();
        assert_eq!(config.tick_range_presets, vec![TickRangePreset::new(-600, 600).unwrap()]);
        assert_eq!(config.salts, vec![B256::with_last_byte(7)]);
        assert_eq!(config.yield_source, YieldSourceKind::None);
    }

    #[test]
    fn test_inverted_preset_rejected_at_parse() {
        let toml = minimal_toml().replacen(
            "rpc_url = \"http://localhost:8545\"",
            "rpc_url = \"http://localhost:8545\"\ntick_range_presets = [[600, -600]]",
            1,
        );
        assert!(ScoutConfig::from_toml(&toml).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.instance_timeout_ms = config.poll_interval_secs * 1_000;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.pools.push(config.pools[0].clone());
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.salts.clear();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.owners.push(config.owners[0].clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_candidate_space_limit() {
        let mut config = valid_config();
        config.salts = (0..=255u8).map(B256::with_last_byte).collect();
        // 1 pool x 5 presets x 256 salts
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scout.toml");
        let path = path.to_str().unwrap();

        create_example_config(path).unwrap();
        let loaded = ScoutConfig::load(path).unwrap();
        assert_eq!(loaded.pools.len(), 1);
        assert_eq!(loaded.pools[0].indicative_apy, Some(8.5));
        assert_eq!(loaded.owners[0].address, Address::repeat_byte(0xaa));
    }
}
