//! 事件驱动的回跑策略
//!
//! 把事件流、池子解析器和 bundle 竞速器串联成管线：
//! pendingTransaction → Sync 日志过滤 → 池子分类 → 镜像解析 → bundle 竞速。
//! 单个事件的任何失败都只记录日志，管线继续处理后续事件；
//! 只有配置错误和事件流显式关闭才会让它停下。

use std::sync::Arc;

use dashmap::DashMap;
use dex::{PairReader, SYNC_TOPIC};
use ethers::prelude::*;
use ethers::types::{Address, H256};
use models::{
    ArbitrageCandidate, LiquiditySnapshotEvent, PendingTransaction, PoolLiquiditySnapshot,
    PoolRecord, LIQUIDITY_SNAPSHOT_EVENT, PENDING_TRANSACTION_EVENT,
};
use serde_json::Value;
use services::{EventStream, PoolResolver};
use executor::BundleRacer;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::snapshot_analyzer::SnapshotAnalyzer;

/// 回跑策略
pub struct BackrunStrategy<M, R> {
    /// 待打包交易事件流
    matchmaker: Arc<EventStream>,
    /// 流动性快照事件流 (可选)
    snapshot_stream: Option<Arc<EventStream>>,
    resolver: Arc<PoolResolver<R>>,
    racer: Arc<BundleRacer<M>>,
    /// 每个池子最近一次披露的流动性快照
    liquidity: DashMap<Address, PoolLiquiditySnapshot>,
}

impl<M, R> BackrunStrategy<M, R>
where
    M: Middleware + 'static,
    R: PairReader + 'static,
{
    pub fn new(
        matchmaker: Arc<EventStream>,
        snapshot_stream: Option<Arc<EventStream>>,
        resolver: Arc<PoolResolver<R>>,
        racer: Arc<BundleRacer<M>>,
    ) -> Self {
        Self {
            matchmaker,
            snapshot_stream,
            resolver,
            racer,
            liquidity: DashMap::new(),
        }
    }

    /// 订阅两类事件并持续处理，直到事件流关闭
    pub async fn run(&self) {
        let mut pending_rx = self.matchmaker.subscribe(PENDING_TRANSACTION_EVENT).await;
        let mut snapshot_rx = match &self.snapshot_stream {
            Some(stream) => Some(stream.subscribe(LIQUIDITY_SNAPSHOT_EVENT).await),
            None => None,
        };

        info!("回跑策略启动");

        loop {
            tokio::select! {
                event = pending_rx.recv() => {
                    match event {
                        Some(value) => self.on_pending_transaction(value).await,
                        // 事件流已关闭
                        None => break,
                    }
                }
                event = recv_opt(&mut snapshot_rx) => {
                    match event {
                        Some(value) => self.on_liquidity_snapshot(value),
                        None => snapshot_rx = None,
                    }
                }
            }
        }

        info!("回跑策略退出");
    }

    /// 处理一笔待打包交易
    async fn on_pending_transaction(&self, value: Value) {
        let tx: PendingTransaction = match serde_json::from_value(value) {
            Ok(tx) => tx,
            Err(e) => {
                warn!("丢弃无法解析的 pendingTransaction 载荷: {e}");
                return;
            }
        };

        debug!("新的待打包交易: {:?}", tx.hash);

        for pool in sync_log_pools(&tx) {
            info!("检测到 V2 池子交易: pool={:?}, tx={:?}", pool, tx.hash);
            self.race_pool(tx.hash, pool).await;
        }
    }

    /// 对单个池子完成 分类 → 镜像 → 竞速
    async fn race_pool(&self, trigger: H256, pool: Address) {
        let Some(record) = self.resolver.resolve_pool(pool).await else {
            return;
        };

        let alternate = self.resolver.alternate_factory(record.factory);
        let Some(mirror) = self
            .resolver
            .resolve_mirror(alternate, record.token0, record.token1)
            .await
        else {
            return;
        };

        let candidate = ArbitrageCandidate {
            trigger_tx_hash: trigger,
            pool_a: record,
            pool_b: PoolRecord {
                address: mirror,
                token0: record.token0,
                token1: record.token1,
                factory: alternate,
            },
        };

        info!(
            target: "arbitrage_opportunity",
            "发现套利候选: {:?} ⇄ {:?}, trigger={:?}",
            candidate.pool_a.address, candidate.pool_b.address, candidate.trigger_tx_hash
        );

        if let Some(snapshot) = self.liquidity.get(&record.address) {
            let analysis = SnapshotAnalyzer::analyze(snapshot.value());
            info!(
                target: "arbitrage_opportunity",
                "池子 {:?} 流动性分析: {:?}", record.address, analysis
            );
        }

        match self
            .racer
            .execute(
                candidate.trigger_tx_hash,
                candidate.pool_a.address,
                candidate.pool_b.address,
            )
            .await
        {
            Ok(report) => debug!("竞速结果: {:?}", report),
            Err(e) => error!("竞速执行失败，管线继续: {e}"),
        }
    }

    /// 记录池子最新的流动性快照
    fn on_liquidity_snapshot(&self, value: Value) {
        let event: LiquiditySnapshotEvent = match serde_json::from_value(value) {
            Ok(ev) => ev,
            Err(e) => {
                warn!("丢弃无法解析的 liquiditySnapshot 载荷: {e}");
                return;
            }
        };

        debug!("更新池子 {:?} 的流动性快照", event.token_pair);
        self.liquidity.insert(event.token_pair, event.liquidity_snapshot);
    }
}

/// 提取日志中 topic0 为 V2 Sync 事件的池子地址
fn sync_log_pools(tx: &PendingTransaction) -> Vec<Address> {
    let Some(logs) = &tx.logs else {
        return Vec::new();
    };

    logs.iter()
        .filter(|log| log.topics.first() == Some(&*SYNC_TOPIC))
        .map(|log| log.address)
        .collect()
}

async fn recv_opt(rx: &mut Option<mpsc::UnboundedReceiver<Value>>) -> Option<Value> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Bytes;
    use models::TransactionLog;

    #[test]
    fn test_sync_log_pools_filters_by_topic() {
        let pool = Address::repeat_byte(0x01);
        let tx = PendingTransaction {
            hash: H256::repeat_byte(0xaa),
            logs: Some(vec![
                TransactionLog {
                    address: pool,
                    topics: vec![*SYNC_TOPIC],
                    data: Bytes::new(),
                },
                TransactionLog {
                    address: Address::repeat_byte(0x02),
                    topics: vec![H256::repeat_byte(0xdd)],
                    data: Bytes::new(),
                },
                TransactionLog {
                    address: Address::repeat_byte(0x03),
                    topics: vec![],
                    data: Bytes::new(),
                },
            ]),
        };

        assert_eq!(sync_log_pools(&tx), vec![pool]);
    }

    #[test]
    fn test_sync_log_pools_without_logs() {
        let tx = PendingTransaction {
            hash: H256::repeat_byte(0xaa),
            logs: None,
        };
        assert!(sync_log_pools(&tx).is_empty());
    }
}
