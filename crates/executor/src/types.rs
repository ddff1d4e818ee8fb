//! 执行器类型定义

use ethers::types::{Bytes, H256, U256};
use thiserror::Error;

use crate::relay::{MevShareBundle, SendMevBundleResponse};

/// 竞速前对链上状态的一次性快照
///
/// 每次竞速只取一次，两个候选共享同一份。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceSnapshot {
    /// 当前链顶区块号
    pub block_number: u64,
    /// 按配置倍数放大后的 gas 价格
    pub gas_price: U256,
    /// 两笔结算交易共用的 nonce——互斥由此保证，最多一笔能上链
    pub nonce: U256,
}

/// 候选的池子下单顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolOrdering {
    /// (firstPair, secondPair)
    Straight,
    /// (secondPair, firstPair)
    Reversed,
}

/// 单个竞速候选：一种下单顺序对应一笔已签名结算交易和它的 bundle
#[derive(Debug, Clone)]
pub struct BundleCandidate {
    pub ordering: PoolOrdering,
    pub signed_tx: Bytes,
    pub bundle: MevShareBundle,
}

/// 一次竞速的两个互斥候选
///
/// 两个候选来自同一份快照（同一个 nonce），结构上保证最多一个被打包。
#[derive(Debug, Clone)]
pub struct BundlePair {
    pub trigger_tx_hash: H256,
    pub snapshot: RaceSnapshot,
    pub straight: BundleCandidate,
    pub reversed: BundleCandidate,
}

/// 单个 bundle 的提交结果
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// 中继接受
    Accepted(SendMevBundleResponse),
    /// 中继拒绝或传输失败；对该 bundle 是终态，不重试
    Rejected(String),
    /// 超过提交期限
    TimedOut,
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted(_))
    }
}

/// 一次竞速的汇总结果，两个候选的结果互不影响
#[derive(Debug)]
pub struct RaceReport {
    pub trigger_tx_hash: H256,
    pub straight: SubmissionOutcome,
    pub reversed: SubmissionOutcome,
}

impl RaceReport {
    /// 是否至少有一个 bundle 被中继接受
    pub fn any_accepted(&self) -> bool {
        self.straight.is_accepted() || self.reversed.is_accepted()
    }
}

/// 竞速器错误
#[derive(Debug, Error)]
pub enum RacerError {
    /// 构造期缺少必要配置，不可恢复
    #[error("缺少必要配置: {0}")]
    MissingConfig(&'static str),
    /// 构造期配置非法，不可恢复
    #[error("配置非法 {0}: {1}")]
    InvalidConfig(&'static str, String),
    #[error("链上状态快照失败: {0}")]
    Snapshot(String),
    #[error("结算交易构建失败: {0}")]
    Build(String),
}
