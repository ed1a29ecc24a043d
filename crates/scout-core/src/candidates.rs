//! # Candidate Generator
//!
//! Enumerates the slots worth probing for one owner: every configured pool,
//! crossed with every tick-range preset, crossed with every salt. Order is
//! pool-major, preset second, salt minor; each candidate also carries its
//! indices so a result can be joined back without re-deriving anything.
//!
//! The presets and salts are a guess at commonly used values. A position
//! opened with an unlisted range or salt is invisible to this enumeration.

use alloy_primitives::{Address, B256};
use scout_types::{CandidateKey, PoolDescriptor, ScoutResult, TickRangePreset};
use tracing::warn;

use crate::encoder::derive_key;

/// Number of candidates the cross-product would produce
pub fn candidate_space_size(pools: usize, presets: usize, salts: usize) -> usize {
    pools.saturating_mul(presets).saturating_mul(salts)
}

/// Generate every candidate key, failing on the first encoding error
pub fn generate_candidates(
    owner: Address,
    pools: &[PoolDescriptor],
    presets: &[TickRangePreset],
    salts: &[B256],
) -> ScoutResult<Vec<CandidateKey>> {
    let mut candidates =
        Vec::with_capacity(candidate_space_size(pools.len(), presets.len(), salts.len()));
    for (pool_index, tick_range_index, salt_index) in tuples(pools, presets, salts) {
        candidates.push(derive_candidate(
            owner,
            pools,
            presets,
            salts,
            pool_index,
            tick_range_index,
            salt_index,
        )?);
    }
    Ok(candidates)
}

/// Generate candidates, logging and skipping tuples that fail to encode.
///
/// Validated presets always encode, so with typed inputs this yields the same
/// keys as [`generate_candidates`].
pub fn collect_candidates(
    owner: Address,
    pools: &[PoolDescriptor],
    presets: &[TickRangePreset],
    salts: &[B256],
) -> Vec<CandidateKey> {
    tuples(pools, presets, salts)
        .filter_map(|(pool_index, tick_range_index, salt_index)| {
            derive_candidate(owner, pools, presets, salts, pool_index, tick_range_index, salt_index)
                .map_err(|error| {
                    warn!(
                        %owner,
                        pool_index,
                        tick_range_index,
                        salt_index,
                        %error,
                        "Dropping candidate that failed to encode"
                    );
                })
                .ok()
        })
        .collect()
}

fn tuples<'a>(
    pools: &'a [PoolDescriptor],
    presets: &'a [TickRangePreset],
    salts: &'a [B256],
) -> impl Iterator<Item = (usize, usize, usize)> + 'a {
    (0..pools.len()).flat_map(move |p| {
        (0..presets.len()).flat_map(move |t| (0..salts.len()).map(move |s| (p, t, s)))
    })
}

fn derive_candidate(
    owner: Address,
    pools: &[PoolDescriptor],
    presets: &[TickRangePreset],
    salts: &[B256],
    pool_index: usize,
    tick_range_index: usize,
    salt_index: usize,
) -> ScoutResult<CandidateKey> {
    let preset = presets[tick_range_index];
    let key = derive_key(
        owner,
        pools[pool_index].pool_id,
        preset.tick_lower(),
        preset.tick_upper(),
        salts[salt_index],
    )?;
    Ok(CandidateKey {
        pool_index,
        tick_range_index,
        salt_index,
        key,
    })
}
