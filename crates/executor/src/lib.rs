//! Bundle 竞速执行模块
//!
//! 对同一个触发交易构建两个池子顺序相反、nonce 相同的回跑结算交易，
//! 打包成 MEV-Share bundle 并发提交到私有中继，让两种顺序互相竞速。
//!
//! ## 模块结构
//!
//! - `racer`: 竞速器，快照链上状态并构建/提交两个互斥候选
//! - `relay`: 中继通信（签名传输、bundle 构建器、协议类型）
//! - `blind_backrun`: 回跑结算合约 ABI 绑定
//! - `types`: 类型定义

mod blind_backrun;
mod racer;
mod types;
pub mod relay;

pub use blind_backrun::BlindBackrun;
pub use racer::{BundleRacer, BundleRacerConfig};
pub use relay::{
    BundleItem, Inclusion, MevBundleBuilder, MevShareBundle, RelayClient, SendMevBundleResponse,
    SimMevBundleResponse,
};
pub use types::{
    BundleCandidate, BundlePair, PoolOrdering, RaceReport, RaceSnapshot, RacerError,
    SubmissionOutcome,
};
