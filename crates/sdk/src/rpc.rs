//! Lightweight EVM JSON-RPC client
//!
//! Implements only what position discovery needs: single calls and batched
//! `eth_call`s, plus a [`PositionReader`] built on top of them.

use std::time::Duration;

use alloy_primitives::{hex, Address, B256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use scout_types::{PoolMeta, RawPositionRecord, ScoutError, ScoutResult};
use tracing::debug;

use crate::abi::{decode_pool_meta, decode_position_record, encode_get_pool_meta, encode_get_position};
use crate::reader::PositionReader;

/// One request inside a JSON-RPC batch
#[derive(Debug, Clone)]
pub struct RpcCall {
    pub method: &'static str,
    pub params: Value,
}

/// RPC response wrapper
#[derive(Debug, Deserialize)]
struct RpcResponse {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

/// RPC error structure
#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn into_result(self) -> ScoutResult<Value> {
        if let Some(error) = self.error {
            return Err(ScoutError::rpc_error(&error.message, Some(error.code)));
        }
        self.result
            .ok_or_else(|| ScoutError::rpc_error("No result in RPC response", None))
    }
}

/// JSON-RPC client over HTTP
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    url: String,
    http: reqwest::Client,
}

impl JsonRpcClient {
    /// Create a client with connect and per-request timeouts
    pub fn new(url: &str, connect_timeout: Duration, request_timeout: Duration) -> ScoutResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ScoutError::invalid_configuration("rpc", &e.to_string()))?;

        Ok(Self {
            url: url.to_string(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, body: &Value) -> ScoutResult<Value> {
        let response = self
            .http
            .post(&self.url)
            .json(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ScoutError::rpc_error(&e.to_string(), None))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| ScoutError::rpc_error(&format!("Invalid response body: {}", e), None))
    }

    /// Make a single JSON-RPC call
    pub async fn call(&self, method: &str, params: Value) -> ScoutResult<Value> {
        debug!("RPC call: {} with params: {}", method, params);

        let body = json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": method,
            "params": params
        });

        let value = self.post(&body).await?;
        let response: RpcResponse = serde_json::from_value(value)
            .map_err(|e| ScoutError::rpc_error(&format!("Malformed RPC response: {}", e), None))?;
        response.into_result()
    }

    /// Send several calls in one HTTP round trip, results index-aligned with `calls`
    pub async fn batch(&self, calls: &[RpcCall]) -> ScoutResult<Vec<ScoutResult<Value>>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        debug!("RPC batch of {} calls to {}", calls.len(), self.url);

        let body = build_batch_body(calls);
        let value = self.post(&body).await?;
        parse_batch_response(value, calls.len())
    }
}

/// Build a batch request body; each call's id is its position
pub fn build_batch_body(calls: &[RpcCall]) -> Value {
    Value::Array(
        calls
            .iter()
            .enumerate()
            .map(|(id, call)| {
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "method": call.method,
                    "params": call.params
                })
            })
            .collect(),
    )
}

/// Put batch responses back into request order.
///
/// Nodes may answer a batch in any order, so entries are matched by id. A
/// request with no matching response gets an error entry. A non-array body
/// means the node rejected the batch as a whole.
pub fn parse_batch_response(body: Value, expected: usize) -> ScoutResult<Vec<ScoutResult<Value>>> {
    let entries = match body {
        Value::Array(entries) => entries,
        other => {
            let response: RpcResponse = serde_json::from_value(other)
                .map_err(|e| ScoutError::rpc_error(&format!("Malformed batch response: {}", e), None))?;
            return Err(response
                .into_result()
                .err()
                .unwrap_or_else(|| ScoutError::rpc_error("Batch answered with a single result", None)));
        }
    };

    let mut slots: Vec<Option<ScoutResult<Value>>> = (0..expected).map(|_| None).collect();
    for entry in entries {
        let response: RpcResponse = match serde_json::from_value(entry) {
            Ok(response) => response,
            Err(e) => {
                debug!("Skipping malformed batch entry: {}", e);
                continue;
            }
        };
        let Some(id) = response.id.map(|id| id as usize) else { continue };
        if let Some(slot) = slots.get_mut(id) {
            *slot = Some(response.into_result());
        }
    }

    Ok(slots
        .into_iter()
        .enumerate()
        .map(|(id, slot)| {
            slot.unwrap_or_else(|| {
                Err(ScoutError::rpc_error(&format!("No response for batch id {}", id), None))
            })
        })
        .collect())
}

/// Decode an `eth_call` hex result
pub fn decode_hex_result(value: &Value) -> ScoutResult<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| ScoutError::decode("eth_call result is not a string"))?;
    hex::decode(text.trim_start_matches("0x"))
        .map_err(|e| ScoutError::decode(&format!("Invalid hex in eth_call result: {}", e)))
}

fn eth_call_params(to: Address, data: &[u8], block_tag: &str) -> Value {
    json!([
        {
            "to": to.to_string(),
            "data": hex::encode_prefixed(data)
        },
        block_tag
    ])
}

// ============================================================================
// Position Reader
// ============================================================================

/// [`PositionReader`] issuing one JSON-RPC batch of `eth_call`s per hook
#[derive(Debug, Clone)]
pub struct RpcPositionReader {
    client: JsonRpcClient,
    block_tag: String,
}

impl RpcPositionReader {
    pub fn new(client: JsonRpcClient) -> Self {
        Self {
            client,
            block_tag: "latest".to_string(),
        }
    }

    /// Read at a fixed block tag instead of `latest`
    pub fn with_block_tag(mut self, block_tag: &str) -> Self {
        self.block_tag = block_tag.to_string();
        self
    }
}

#[async_trait]
impl PositionReader for RpcPositionReader {
    async fn read_positions(
        &self,
        hook: Address,
        keys: &[B256],
    ) -> ScoutResult<Vec<Option<RawPositionRecord>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let calls: Vec<RpcCall> = keys
            .iter()
            .map(|key| RpcCall {
                method: "eth_call",
                params: eth_call_params(hook, &encode_get_position(*key), &self.block_tag),
            })
            .collect();

        let responses = self
            .client
            .batch(&calls)
            .await
            .map_err(|e| ScoutError::transport(hook, &e.to_string()))?;

        // A revert or empty return data is an empty slot. Any other entry
        // failure means the slot was not checked, so the whole instance fails.
        let mut records = Vec::with_capacity(keys.len());
        for (response, key) in responses.into_iter().zip(keys) {
            let value = match response {
                Ok(value) => value,
                Err(error) if error.is_revert() => {
                    debug!(%hook, %key, %error, "Position read reverted, treating slot as absent");
                    records.push(None);
                    continue;
                }
                Err(error) => {
                    return Err(ScoutError::transport(
                        hook,
                        &format!("read of key {} failed: {}", key, error),
                    ))
                }
            };
            let record = decode_hex_result(&value)
                .and_then(|bytes| decode_position_record(&bytes))
                .map_err(|e| ScoutError::transport(hook, &format!("key {}: {}", key, e)))?;
            records.push(record);
        }

        Ok(records)
    }

    async fn read_pool_meta(&self, hook: Address, pool_id: B256) -> ScoutResult<PoolMeta> {
        let params = eth_call_params(hook, &encode_get_pool_meta(pool_id), &self.block_tag);
        let value = self
            .client
            .call("eth_call", params)
            .await
            .map_err(|e| ScoutError::transport(hook, &e.to_string()))?;
        decode_pool_meta(&decode_hex_result(&value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calls(n: usize) -> Vec<RpcCall> {
        (0..n)
            .map(|_| RpcCall {
                method: "eth_call",
                params: json!([]),
            })
            .collect()
    }

    #[test]
    fn test_batch_body_ids_follow_order() {
        let body = build_batch_body(&calls(3));
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry["id"], json!(i));
            assert_eq!(entry["method"], json!("eth_call"));
        }
    }

    #[test]
    fn test_parse_reorders_by_id() {
        let body = json!([
            {"jsonrpc": "2.0", "id": 2, "result": "0x02"},
            {"jsonrpc": "2.0", "id": 0, "result": "0x00"},
            {"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "execution reverted"}}
        ]);
        let parsed = parse_batch_response(body, 3).unwrap();
        assert_eq!(parsed[0].as_ref().unwrap(), &json!("0x00"));
        assert!(matches!(parsed[1], Err(ScoutError::Rpc { code: Some(-32000), .. })));
        assert_eq!(parsed[2].as_ref().unwrap(), &json!("0x02"));
    }

    #[test]
    fn test_parse_fills_missing_entries() {
        let body = json!([{"jsonrpc": "2.0", "id": 0, "result": "0x"}]);
        let parsed = parse_batch_response(body, 2).unwrap();
        assert!(parsed[0].is_ok());
        assert!(parsed[1].is_err());
    }

    #[test]
    fn test_parse_whole_batch_rejection() {
        let body = json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32600, "message": "batch too large"}});
        let err = parse_batch_response(body, 4).unwrap_err();
        assert!(matches!(err, ScoutError::Rpc { code: Some(-32600), .. }));
    }

    #[test]
    fn test_decode_hex_result() {
        assert_eq!(decode_hex_result(&json!("0x")).unwrap(), Vec::<u8>::new());
        assert_eq!(decode_hex_result(&json!("0x0aff")).unwrap(), vec![0x0a, 0xff]);
        assert!(decode_hex_result(&json!(12)).is_err());
        assert!(decode_hex_result(&json!("0xzz")).is_err());
    }

    #[test]
    fn test_eth_call_params_shape() {
        let hook = Address::repeat_byte(0x0b);
        let params = eth_call_params(hook, &[0x19, 0x28], "latest");
        assert_eq!(params[0]["data"], json!("0x1928"));
        assert_eq!(params[1], json!("latest"));
        assert_eq!(
            params[0]["to"].as_str().unwrap().to_lowercase(),
            format!("0x{}", "0b".repeat(20))
        );
    }
}
