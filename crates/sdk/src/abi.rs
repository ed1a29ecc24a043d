//! Call data and return decoding for the hook's read surface

use alloy_primitives::{B256, U256};
use alloy_sol_types::{sol, SolCall};
use scout_types::{PoolMeta, RawPositionRecord, ScoutError, ScoutResult};

sol! {
    /// Position stored under a derived key; all zero when the slot is empty
    function getPosition(bytes32 key)
        external
        view
        returns (uint128 liquidity, uint256 fundingGrowthSnapshot, int256 fundingOwed);

    function getPoolMeta(bytes32 poolId)
        external
        view
        returns (uint64 maturity, uint128 totalLiquidity, bool frozen);
}

/// Call data for `getPosition(key)`
pub fn encode_get_position(key: B256) -> Vec<u8> {
    getPositionCall { key }.abi_encode()
}

/// Call data for `getPoolMeta(pool_id)`
pub fn encode_get_pool_meta(pool_id: B256) -> Vec<u8> {
    getPoolMetaCall { poolId: pool_id }.abi_encode()
}

/// Decode `getPosition` return data; empty data means nothing is stored
pub fn decode_position_record(data: &[u8]) -> ScoutResult<Option<RawPositionRecord>> {
    if data.is_empty() {
        return Ok(None);
    }
    let ret = getPositionCall::abi_decode_returns(data, true)
        .map_err(|e| ScoutError::decode(&format!("getPosition returns: {}", e)))?;
    Ok(Some(RawPositionRecord {
        liquidity: U256::from(ret.liquidity),
        funding_growth_snapshot: ret.fundingGrowthSnapshot,
        funding_owed: ret.fundingOwed,
    }))
}

/// Decode `getPoolMeta` return data
pub fn decode_pool_meta(data: &[u8]) -> ScoutResult<PoolMeta> {
    let ret = getPoolMetaCall::abi_decode_returns(data, true)
        .map_err(|e| ScoutError::decode(&format!("getPoolMeta returns: {}", e)))?;
    Ok(PoolMeta {
        maturity: ret.maturity,
        total_liquidity: ret.totalLiquidity,
        frozen: ret.frozen,
    })
}
