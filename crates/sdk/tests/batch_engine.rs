//! Batch query engine tests against the in-memory reader

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use scout_core::generate_candidates;
use scout_sdk::testing::{record, MockPositionReader};
use scout_sdk::{enrich_pools, BatchQueryEngine, PoolDescriptor, PoolMeta, ScoutError, TickRangePreset};

const HOOK_A: u8 = 0xa1;
const HOOK_B: u8 = 0xb2;

fn pool(byte: u8, hook: u8) -> PoolDescriptor {
    PoolDescriptor {
        pool_id: B256::repeat_byte(byte),
        hook_address: Address::repeat_byte(hook),
        name: String::new(),
        token0_symbol: "USDC".to_string(),
        token1_symbol: "WETH".to_string(),
        maturity_timestamp: 1_735_689_600,
        tick_spacing: 60,
        indicative_apy: None,
        meta: None,
    }
}

fn pools() -> Vec<PoolDescriptor> {
    vec![pool(1, HOOK_A), pool(2, HOOK_B), pool(3, HOOK_A)]
}

fn presets() -> Vec<TickRangePreset> {
    vec![
        TickRangePreset::new(-23_040, 23_040).unwrap(),
        TickRangePreset::new(-60, 60).unwrap(),
    ]
}

fn salts() -> Vec<B256> {
    vec![B256::ZERO, B256::with_last_byte(1)]
}

fn owner() -> Address {
    Address::repeat_byte(0xaa)
}

fn engine(reader: Arc<MockPositionReader>, timeout_ms: u64) -> BatchQueryEngine {
    BatchQueryEngine::new(reader, Duration::from_millis(timeout_ms))
}

#[tokio::test]
async fn test_results_align_with_candidates_for_every_prefix() {
    let reader = Arc::new(MockPositionReader::new());
    let pools = pools();
    let candidates = generate_candidates(owner(), &pools, &presets(), &salts()).unwrap();

    // Every third candidate holds liquidity equal to its position
    for (i, c) in candidates.iter().enumerate() {
        if i % 3 == 0 {
            reader.insert(pools[c.pool_index].hook_address, c.key, record(i as u64 + 1, 0));
        }
    }

    let engine = engine(reader.clone(), 1_000);
    for len in 0..=candidates.len() {
        let slice = &candidates[..len];
        let results = engine.batch_query(slice, &pools).await.unwrap();
        assert_eq!(results.len(), len);
        for (i, result) in results.iter().enumerate() {
            if i % 3 == 0 {
                assert_eq!(result.unwrap().liquidity, record(i as u64 + 1, 0).liquidity);
            } else {
                assert!(result.is_none());
            }
        }
    }
}

#[tokio::test]
async fn test_empty_input_performs_no_io() {
    let reader = Arc::new(MockPositionReader::new());
    let results = engine(reader.clone(), 1_000).batch_query(&[], &pools()).await.unwrap();
    assert!(results.is_empty());
    assert_eq!(reader.call_count(), 0);
}

#[tokio::test]
async fn test_one_request_per_instance() {
    let reader = Arc::new(MockPositionReader::new());
    let pools = pools();
    let candidates = generate_candidates(owner(), &pools, &presets(), &salts()).unwrap();

    engine(reader.clone(), 1_000).batch_query(&candidates, &pools).await.unwrap();
    assert_eq!(reader.call_count(), 2);
}

#[tokio::test]
async fn test_failed_instance_reads_as_absent() {
    let reader = Arc::new(MockPositionReader::new());
    let pools = pools();
    let candidates = generate_candidates(owner(), &pools, &presets(), &salts()).unwrap();
    for c in &candidates {
        reader.insert(pools[c.pool_index].hook_address, c.key, record(10, 0));
    }
    reader.fail_instance(Address::repeat_byte(HOOK_B));

    let results = engine(reader, 1_000).batch_query(&candidates, &pools).await.unwrap();
    for (c, result) in candidates.iter().zip(&results) {
        if pools[c.pool_index].hook_address == Address::repeat_byte(HOOK_B) {
            assert!(result.is_none());
        } else {
            assert!(result.is_some());
        }
    }
}

#[tokio::test]
async fn test_all_instances_failing_aborts_the_cycle() {
    let reader = Arc::new(MockPositionReader::new());
    reader.fail_instance(Address::repeat_byte(HOOK_A));
    reader.fail_instance(Address::repeat_byte(HOOK_B));
    let pools = pools();
    let candidates = generate_candidates(owner(), &pools, &presets(), &salts()).unwrap();

    let err = engine(reader, 1_000).batch_query(&candidates, &pools).await.unwrap_err();
    assert_eq!(err, ScoutError::CycleAbort { failed_instances: 2 });
}

#[tokio::test]
async fn test_slow_instance_times_out_without_hanging() {
    let reader = Arc::new(MockPositionReader::new());
    let pools = pools();
    let candidates = generate_candidates(owner(), &pools, &presets(), &salts()).unwrap();
    for c in &candidates {
        reader.insert(pools[c.pool_index].hook_address, c.key, record(10, 0));
    }
    reader.delay_instance(Address::repeat_byte(HOOK_A), Duration::from_secs(5));

    let started = std::time::Instant::now();
    let results = engine(reader, 100).batch_query(&candidates, &pools).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    let present = results.iter().filter(|r| r.is_some()).count();
    // Only pool 2 (hook B) answered: 2 presets x 2 salts
    assert_eq!(present, 4);
}

#[tokio::test]
async fn test_short_answer_is_an_instance_failure() {
    let reader = Arc::new(MockPositionReader::new());
    let pools = pools();
    let candidates = generate_candidates(owner(), &pools, &presets(), &salts()).unwrap();
    for c in &candidates {
        reader.insert(pools[c.pool_index].hook_address, c.key, record(10, 0));
    }
    reader.truncate_instance(Address::repeat_byte(HOOK_A));

    let results = engine(reader, 1_000).batch_query(&candidates, &pools).await.unwrap();
    for (c, result) in candidates.iter().zip(&results) {
        let from_a = pools[c.pool_index].hook_address == Address::repeat_byte(HOOK_A);
        assert_eq!(result.is_none(), from_a);
    }
}

#[tokio::test]
async fn test_enrich_pools_applies_on_chain_maturity() {
    let reader = MockPositionReader::new();
    let mut pools = pools();
    reader.insert_meta(
        Address::repeat_byte(HOOK_A),
        B256::repeat_byte(1),
        PoolMeta {
            maturity: 1_767_225_600,
            total_liquidity: 1_000,
            frozen: false,
        },
    );

    let enriched = enrich_pools(&reader, &mut pools, Duration::from_secs(1)).await;
    assert_eq!(enriched, 1);
    assert_eq!(pools[0].maturity_timestamp, 1_767_225_600);
    assert!(pools[0].meta.is_some());
    // Pools without readable metadata keep their configured values
    assert_eq!(pools[1].maturity_timestamp, 1_735_689_600);
    assert!(pools[1].meta.is_none());
}

#[tokio::test]
async fn test_enrich_pools_ignores_unrepresentable_maturity() {
    let reader = MockPositionReader::new();
    let mut pools = pools();
    reader.insert_meta(
        Address::repeat_byte(HOOK_B),
        B256::repeat_byte(2),
        PoolMeta {
            maturity: 10_000_000_000_000,
            total_liquidity: 1_000,
            frozen: false,
        },
    );

    let enriched = enrich_pools(&reader, &mut pools, Duration::from_secs(1)).await;
    assert_eq!(enriched, 0);
    assert_eq!(pools[1].maturity_timestamp, 1_735_689_600);
    assert!(pools[1].meta.is_none());
    assert!(pools[1].maturity_date().is_ok());
}
