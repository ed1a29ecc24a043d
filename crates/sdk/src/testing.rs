//! Testing utilities: an in-memory [`PositionReader`] with scriptable failures

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{Address, B256, I256, U256};
use async_trait::async_trait;
use scout_types::{PoolMeta, RawPositionRecord, ScoutError, ScoutResult};

use crate::reader::PositionReader;

/// In-memory hook storage keyed by (hook, key)
#[derive(Default)]
pub struct MockPositionReader {
    records: Mutex<HashMap<(Address, B256), RawPositionRecord>>,
    metas: Mutex<HashMap<(Address, B256), PoolMeta>>,
    failing: Mutex<HashSet<Address>>,
    delays: Mutex<HashMap<Address, Duration>>,
    short_answers: Mutex<HashSet<Address>>,
    calls: AtomicUsize,
}

impl MockPositionReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record under `key` on `hook`
    pub fn insert(&self, hook: Address, key: B256, record: RawPositionRecord) {
        self.records.lock().unwrap().insert((hook, key), record);
    }

    /// Remove every stored record
    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }

    pub fn insert_meta(&self, hook: Address, pool_id: B256, meta: PoolMeta) {
        self.metas.lock().unwrap().insert((hook, pool_id), meta);
    }

    /// Make every read against `hook` fail with a transport error
    pub fn fail_instance(&self, hook: Address) {
        self.failing.lock().unwrap().insert(hook);
    }

    /// Undo [`fail_instance`](Self::fail_instance)
    pub fn heal_instance(&self, hook: Address) {
        self.failing.lock().unwrap().remove(&hook);
    }

    /// Delay every read against `hook`
    pub fn delay_instance(&self, hook: Address, delay: Duration) {
        self.delays.lock().unwrap().insert(hook, delay);
    }

    /// Make `hook` answer with one record fewer than requested
    pub fn truncate_instance(&self, hook: Address) {
        self.short_answers.lock().unwrap().insert(hook);
    }

    /// Number of `read_positions` calls served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PositionReader for MockPositionReader {
    async fn read_positions(
        &self,
        hook: Address,
        keys: &[B256],
    ) -> ScoutResult<Vec<Option<RawPositionRecord>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(&hook).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&hook) {
            return Err(ScoutError::transport(hook, "connection refused"));
        }

        let records = self.records.lock().unwrap();
        let mut out: Vec<Option<RawPositionRecord>> = keys
            .iter()
            .map(|key| records.get(&(hook, *key)).copied())
            .collect();
        if self.short_answers.lock().unwrap().contains(&hook) {
            out.pop();
        }
        Ok(out)
    }

    async fn read_pool_meta(&self, hook: Address, pool_id: B256) -> ScoutResult<PoolMeta> {
        if self.failing.lock().unwrap().contains(&hook) {
            return Err(ScoutError::transport(hook, "connection refused"));
        }
        self.metas
            .lock()
            .unwrap()
            .get(&(hook, pool_id))
            .copied()
            .ok_or_else(|| ScoutError::transport(hook, "execution reverted"))
    }
}

/// Record with the given liquidity and signed funding owed
pub fn record(liquidity: u64, funding_owed: i64) -> RawPositionRecord {
    RawPositionRecord {
        liquidity: U256::from(liquidity),
        funding_growth_snapshot: U256::ZERO,
        funding_owed: I256::try_from(funding_owed).unwrap_or(I256::ZERO),
    }
}
