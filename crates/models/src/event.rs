//! 事件流载荷类型
//!
//! 事件源推送的每条消息都带一个 `event` 判别字段，这里定义各事件类型的载荷。

use ethers::types::{Address, Bytes, H256};
use serde::{Deserialize, Serialize};

use crate::snapshot::PoolLiquiditySnapshot;

/// 待打包交易事件的判别名
pub const PENDING_TRANSACTION_EVENT: &str = "pendingTransaction";
/// 流动性快照事件的判别名
pub const LIQUIDITY_SNAPSHOT_EVENT: &str = "liquiditySnapshot";

/// 事件流披露的待打包交易
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: H256,
    /// 交易日志；隐私交易可能不披露，此时为 None
    #[serde(default)]
    pub logs: Option<Vec<TransactionLog>>,
}

/// 交易日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLog {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

/// 流动性快照事件：单个池子最新的快照数据
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquiditySnapshotEvent {
    pub token_pair: Address,
    pub liquidity_snapshot: PoolLiquiditySnapshot,
}
