use ethers::types::H256;

use crate::pool::PoolRecord;

/// 一次待竞速的套利候选
///
/// 每个触发事件构造一个，交给竞速器消费后即丢弃，不做持久化。
#[derive(Debug, Clone)]
pub struct ArbitrageCandidate {
    /// 触发本次机会的待打包交易哈希
    pub trigger_tx_hash: H256,
    /// 事件中观察到的池子
    pub pool_a: PoolRecord,
    /// 另一个交易所上的镜像池
    pub pool_b: PoolRecord,
}
