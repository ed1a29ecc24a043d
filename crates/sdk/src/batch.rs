//! Batch Query Engine
//!
//! Groups candidates by the hook that stores them, reads every group
//! concurrently with one request each, and scatters the answers back into
//! candidate order. A group that fails or times out reads as absent; only
//! when every group fails is the batch itself an error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use futures::future::join_all;
use scout_types::{CandidateKey, PoolDescriptor, RawPositionRecord, ScoutError, ScoutResult};
use tracing::{debug, warn};

use crate::reader::PositionReader;

/// Candidate positions addressed to one hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceGroup {
    pub hook: Address,
    /// Indices into the candidate slice
    pub indices: Vec<usize>,
}

/// Group candidate indices by hook, groups ordered by first appearance
pub fn group_by_instance(
    candidates: &[CandidateKey],
    pools: &[PoolDescriptor],
) -> ScoutResult<Vec<InstanceGroup>> {
    let mut groups: Vec<InstanceGroup> = Vec::new();
    let mut by_hook: HashMap<Address, usize> = HashMap::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let pool = pools.get(candidate.pool_index).ok_or_else(|| {
            ScoutError::reconcile(&format!(
                "candidate {} references unknown pool index {}",
                index, candidate.pool_index
            ))
        })?;
        let slot = *by_hook.entry(pool.hook_address).or_insert_with(|| {
            groups.push(InstanceGroup {
                hook: pool.hook_address,
                indices: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].indices.push(index);
    }

    Ok(groups)
}

/// Reads candidate keys from their hooks in one round trip per hook
#[derive(Clone)]
pub struct BatchQueryEngine {
    reader: Arc<dyn PositionReader>,
    instance_timeout: Duration,
}

impl BatchQueryEngine {
    pub fn new(reader: Arc<dyn PositionReader>, instance_timeout: Duration) -> Self {
        Self {
            reader,
            instance_timeout,
        }
    }

    pub fn reader(&self) -> &Arc<dyn PositionReader> {
        &self.reader
    }

    pub fn instance_timeout(&self) -> Duration {
        self.instance_timeout
    }

    /// Query every candidate; the result is index-aligned with `candidates`
    pub async fn batch_query(
        &self,
        candidates: &[CandidateKey],
        pools: &[PoolDescriptor],
    ) -> ScoutResult<Vec<Option<RawPositionRecord>>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let groups = group_by_instance(candidates, pools)?;
        debug!(
            candidates = candidates.len(),
            instances = groups.len(),
            "Issuing batched position reads"
        );

        let reads = groups.iter().map(|group| {
            let keys: Vec<B256> = group.indices.iter().map(|&i| candidates[i].key).collect();
            self.read_group(group.hook, keys)
        });
        let outcomes = join_all(reads).await;

        let mut results: Vec<Option<RawPositionRecord>> = vec![None; candidates.len()];
        let mut failed_instances = 0;

        for (group, outcome) in groups.iter().zip(outcomes) {
            match outcome {
                Ok(records) => {
                    for (&index, record) in group.indices.iter().zip(records) {
                        results[index] = record;
                    }
                }
                Err(error) => {
                    failed_instances += 1;
                    warn!(
                        hook = %group.hook,
                        candidates = group.indices.len(),
                        %error,
                        "Instance read failed, treating its candidates as absent"
                    );
                }
            }
        }

        if failed_instances == groups.len() {
            warn!(failed_instances, "Every remote instance failed in this batch");
            return Err(ScoutError::CycleAbort { failed_instances });
        }

        Ok(results)
    }

    async fn read_group(
        &self,
        hook: Address,
        keys: Vec<B256>,
    ) -> ScoutResult<Vec<Option<RawPositionRecord>>> {
        let read = self.reader.read_positions(hook, &keys);
        let records = match tokio::time::timeout(self.instance_timeout, read).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ScoutError::timeout(
                    hook,
                    self.instance_timeout.as_millis() as u64,
                ))
            }
        };

        if records.len() != keys.len() {
            return Err(ScoutError::transport(
                hook,
                &format!("expected {} records, got {}", keys.len(), records.len()),
            ));
        }
        Ok(records)
    }
}
