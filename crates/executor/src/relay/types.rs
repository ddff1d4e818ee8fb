//! MEV-Share 协议类型定义

use ethers::types::{H256, U256};
use serde::{Deserialize, Serialize};

/// bundle 协议版本标记
pub const PROTOCOL_VERSION: &str = "beta-1";

/// 提交给中继的 bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MevShareBundle {
    pub version: String,
    pub inclusion: Inclusion,
    pub body: Vec<BundleItem>,
}

/// 目标区块窗口，闭区间，两端都是十六进制区块号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inclusion {
    pub block: String,
    pub max_block: String,
}

/// bundle 内的条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BundleItem {
    /// 锚定交易：bundle 以该待打包交易为前置条件
    Hash { hash: H256 },
    /// 签名后的结算交易；canRevert=false 表示它回滚时整个 bundle 作废
    #[serde(rename_all = "camelCase")]
    Tx { tx: String, can_revert: bool },
}

/// mev_sendBundle 响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMevBundleResponse {
    #[serde(default)]
    pub bundle_hash: Option<H256>,
    /// 矿工收益指标 (部分中继提供)
    #[serde(default)]
    pub miner_reward: Option<U256>,
    /// 中继转发状态
    #[serde(default)]
    pub relay_submission: Option<serde_json::Value>,
}

/// mev_simBundle 响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimMevBundleResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub state_block: Option<String>,
    #[serde(default)]
    pub profit: Option<U256>,
    #[serde(default)]
    pub refundable_value: Option<U256>,
    #[serde(default)]
    pub gas_used: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// JSON-RPC 请求封套
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T: Serialize> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: T,
}

impl<T: Serialize> JsonRpcRequest<T> {
    pub fn new(id: u64, method: &'static str, params: T) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC 响应
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct JsonRpcResponse<T> {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 错误
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bundle_wire_shape() {
        let bundle = MevShareBundle {
            version: PROTOCOL_VERSION.to_string(),
            inclusion: Inclusion {
                block: "0x1036641".to_string(),
                max_block: "0x103664b".to_string(),
            },
            body: vec![
                BundleItem::Hash {
                    hash: H256::repeat_byte(0xaa),
                },
                BundleItem::Tx {
                    tx: "0x02f8".to_string(),
                    can_revert: false,
                },
            ],
        };

        let encoded = serde_json::to_value(&bundle).unwrap();
        assert_eq!(
            encoded,
            json!({
                "version": "beta-1",
                "inclusion": {
                    "block": "0x1036641",
                    "maxBlock": "0x103664b"
                },
                "body": [
                    {"hash": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"},
                    {"tx": "0x02f8", "canRevert": false}
                ]
            })
        );
    }

    #[test]
    fn test_request_envelope_shape() {
        let request = JsonRpcRequest::new(7, "mev_sendBundle", json!(["params"]));
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "mev_sendBundle",
                "params": ["params"]
            })
        );
    }

    #[test]
    fn test_decode_send_bundle_response() {
        let raw = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"bundleHash": "0x1111111111111111111111111111111111111111111111111111111111111111"}
        }"#;
        let response: JsonRpcResponse<SendMevBundleResponse> = serde_json::from_str(raw).unwrap();
        let result = response.result.unwrap();
        assert_eq!(result.bundle_hash, Some(H256::repeat_byte(0x11)));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_decode_rpc_error() {
        let raw = r#"{"jsonrpc": "2.0", "id": 2, "error": {"code": -32600, "message": "invalid bundle"}}"#;
        let response: JsonRpcResponse<SendMevBundleResponse> = serde_json::from_str(raw).unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32600);
        assert_eq!(error.message, "invalid bundle");
    }
}
