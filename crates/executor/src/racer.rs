//! Bundle 竞速器
//!
//! 给定触发交易和两个互为镜像的池子，构建两个池子顺序相反、
//! nonce 相同的结算 bundle，并发提交到中继。两个 bundle 是同一个
//! 状态迁移的两种提案而不是两笔独立交易，最多一个能被打包。

use std::sync::Arc;
use std::time::Duration;

use ethers::prelude::*;
use ethers::signers::LocalWallet;
use ethers::types::transaction::eip2718::TypedTransaction;
use tracing::{info, warn};

use crate::blind_backrun::BlindBackrun;
use crate::relay::{MevBundleBuilder, MevShareBundle, RelayClient, SimMevBundleResponse};
use crate::types::{
    BundleCandidate, BundlePair, PoolOrdering, RaceReport, RaceSnapshot, RacerError,
    SubmissionOutcome,
};

/// 竞速器配置
#[derive(Debug, Clone)]
pub struct BundleRacerConfig {
    /// 回跑结算合约地址
    pub contract_address: Option<Address>,
    /// 留存利润百分比 (1-100)
    pub percentage_to_keep: Option<u64>,
    /// 目标区块窗口宽度
    pub blocks_to_try: u64,
    /// 结算交易 gas 上限
    pub gas_limit: u64,
    /// 快照 gas 价格的放大系数，1.0 即按快照原价
    pub gas_price_multiplier: f64,
    /// 单个 bundle 的提交期限
    pub submit_deadline: Duration,
}

impl Default for BundleRacerConfig {
    fn default() -> Self {
        Self {
            contract_address: None,
            percentage_to_keep: None,
            blocks_to_try: 10,
            gas_limit: 400_000,
            gas_price_multiplier: 1.0,
            submit_deadline: Duration::from_secs(30),
        }
    }
}

/// Bundle 竞速器
#[derive(Debug)]
pub struct BundleRacer<M> {
    provider: Arc<M>,
    /// 结算交易签名钱包
    tx_signer: LocalWallet,
    contract: BlindBackrun<M>,
    relay: Arc<RelayClient>,
    percentage_to_keep: U256,
    blocks_to_try: u64,
    gas_limit: U256,
    gas_price_multiplier: f64,
    submit_deadline: Duration,
}

impl<M: Middleware + 'static> BundleRacer<M> {
    /// 创建竞速器
    ///
    /// 任何缺失或非法的必要配置都是构造期致命错误，进程不应继续服务事件。
    pub fn new(
        provider: Arc<M>,
        tx_signer: LocalWallet,
        relay: Option<Arc<RelayClient>>,
        config: BundleRacerConfig,
    ) -> Result<Self, RacerError> {
        let relay = relay.ok_or(RacerError::MissingConfig("relay"))?;
        let contract_address = config
            .contract_address
            .ok_or(RacerError::MissingConfig("contract_address"))?;
        let percentage = config
            .percentage_to_keep
            .ok_or(RacerError::MissingConfig("percentage_to_keep"))?;
        if percentage == 0 || percentage > 100 {
            return Err(RacerError::InvalidConfig(
                "percentage_to_keep",
                format!("{} 不在 1..=100 范围内", percentage),
            ));
        }
        if config.gas_price_multiplier < 1.0 {
            return Err(RacerError::InvalidConfig(
                "gas_price_multiplier",
                format!("{} 小于 1.0", config.gas_price_multiplier),
            ));
        }

        let contract = BlindBackrun::new(contract_address, provider.clone());
        info!(
            "🏁 Bundle 竞速器就绪: contract={:?}, relay={}, window={} blocks",
            contract_address,
            relay.relay_url(),
            config.blocks_to_try
        );

        Ok(Self {
            provider,
            tx_signer,
            contract,
            relay,
            percentage_to_keep: U256::from(percentage),
            blocks_to_try: config.blocks_to_try,
            gas_limit: U256::from(config.gas_limit),
            gas_price_multiplier: config.gas_price_multiplier,
            submit_deadline: config.submit_deadline,
        })
    }

    /// 对触发交易执行一次竞速
    ///
    /// 构建/签名失败作为单个错误返回；已发出的提交不会被取消，
    /// 两个提交的结果互不影响，拒绝即终态（窗口过期后重发已无意义）。
    pub async fn execute(
        &self,
        trigger_tx_hash: H256,
        first_pair: Address,
        second_pair: Address,
    ) -> Result<RaceReport, RacerError> {
        info!(
            target: "arbitrage_opportunity",
            "🏁 开始竞速: trigger={:?}, first={:?}, second={:?}",
            trigger_tx_hash, first_pair, second_pair
        );

        let snapshot = self.snapshot().await?;
        let pair = self
            .build_bundle_pair(trigger_tx_hash, first_pair, second_pair, &snapshot)
            .await?;

        info!(
            "提交两个竞速 bundle: 目标区块 {} 到 {}",
            snapshot.block_number + 1,
            snapshot.block_number + 1 + self.blocks_to_try
        );

        // 两个提交先同时发起再一起等待，一个的传播延迟不拖慢另一个
        let (straight, reversed) = tokio::join!(
            self.submit(&pair.straight.bundle, PoolOrdering::Straight),
            self.submit(&pair.reversed.bundle, PoolOrdering::Reversed),
        );

        let report = RaceReport {
            trigger_tx_hash,
            straight,
            reversed,
        };
        if report.any_accepted() {
            info!(
                target: "arbitrage_opportunity",
                "✅ 竞速完成，中继已接受 bundle: trigger={:?}", trigger_tx_hash
            );
        } else {
            warn!(
                target: "arbitrage_opportunity",
                "竞速完成，两个 bundle 均未被接受: trigger={:?}", trigger_tx_hash
            );
        }
        Ok(report)
    }

    /// 通过中继模拟 straight 顺序的 bundle（诊断入口，不提交）
    pub async fn simulate(
        &self,
        trigger_tx_hash: H256,
        first_pair: Address,
        second_pair: Address,
    ) -> Result<SimMevBundleResponse, RacerError> {
        let snapshot = self.snapshot().await?;
        let pair = self
            .build_bundle_pair(trigger_tx_hash, first_pair, second_pair, &snapshot)
            .await?;

        self.relay
            .sim_bundle(&pair.straight.bundle)
            .await
            .map_err(|e| RacerError::Build(format!("{e:#}")))
    }

    /// 一次性快照链上状态
    async fn snapshot(&self) -> Result<RaceSnapshot, RacerError> {
        let block_number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| RacerError::Snapshot(e.to_string()))?
            .as_u64();
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| RacerError::Snapshot(e.to_string()))?;
        let nonce = self
            .provider
            .get_transaction_count(self.tx_signer.address(), None)
            .await
            .map_err(|e| RacerError::Snapshot(e.to_string()))?;

        Ok(RaceSnapshot {
            block_number,
            gas_price: scale_gas_price(gas_price, self.gas_price_multiplier),
            nonce,
        })
    }

    /// 从同一份快照构建两个顺序相反的候选
    pub(crate) async fn build_bundle_pair(
        &self,
        trigger_tx_hash: H256,
        first_pair: Address,
        second_pair: Address,
        snapshot: &RaceSnapshot,
    ) -> Result<BundlePair, RacerError> {
        let straight = self
            .build_candidate(
                trigger_tx_hash,
                first_pair,
                second_pair,
                PoolOrdering::Straight,
                snapshot,
            )
            .await?;
        let reversed = self
            .build_candidate(
                trigger_tx_hash,
                second_pair,
                first_pair,
                PoolOrdering::Reversed,
                snapshot,
            )
            .await?;

        Ok(BundlePair {
            trigger_tx_hash,
            snapshot: *snapshot,
            straight,
            reversed,
        })
    }

    async fn build_candidate(
        &self,
        trigger_tx_hash: H256,
        pool_in: Address,
        pool_out: Address,
        ordering: PoolOrdering,
        snapshot: &RaceSnapshot,
    ) -> Result<BundleCandidate, RacerError> {
        let tx = self.settlement_tx(pool_in, pool_out, snapshot);

        let signature = self
            .tx_signer
            .sign_transaction(&tx)
            .await
            .map_err(|e| RacerError::Build(e.to_string()))?;
        let signed_tx = tx.rlp_signed(&signature);

        let bundle = MevBundleBuilder::new()
            .anchor_transaction(trigger_tx_hash)
            .push_transaction(signed_tx.clone())
            .inclusion_window(snapshot.block_number + 1, self.blocks_to_try)
            .build();

        Ok(BundleCandidate {
            ordering,
            signed_tx,
            bundle,
        })
    }

    /// 按指定顺序构建未签名的结算交易，gas/nonce 全部取自快照
    fn settlement_tx(
        &self,
        pool_in: Address,
        pool_out: Address,
        snapshot: &RaceSnapshot,
    ) -> TypedTransaction {
        let mut tx = self
            .contract
            .execute_arbitrage(pool_in, pool_out, self.percentage_to_keep)
            .tx
            .clone();
        tx.set_gas(self.gas_limit);
        tx.set_gas_price(snapshot.gas_price);
        tx.set_nonce(snapshot.nonce);
        tx.set_chain_id(self.tx_signer.chain_id());
        tx
    }

    /// 提交单个 bundle
    async fn submit(&self, bundle: &MevShareBundle, ordering: PoolOrdering) -> SubmissionOutcome {
        match tokio::time::timeout(self.submit_deadline, self.relay.send_bundle(bundle)).await {
            Ok(Ok(response)) => {
                info!(
                    target: "relay",
                    "bundle 已接受 [{:?}]: hash={:?}, miner_reward={:?}, relay_submission={:?}",
                    ordering, response.bundle_hash, response.miner_reward, response.relay_submission
                );
                SubmissionOutcome::Accepted(response)
            }
            Ok(Err(e)) => {
                warn!(target: "relay", "bundle 被拒绝 [{:?}]: {e:#}", ordering);
                SubmissionOutcome::Rejected(format!("{e:#}"))
            }
            Err(_) => {
                warn!(target: "relay", "bundle 提交超时 [{:?}]", ordering);
                SubmissionOutcome::TimedOut
            }
        }
    }
}

/// 按倍数放大 gas 价格，以 1/1000 为精度做整数缩放
fn scale_gas_price(gas_price: U256, multiplier: f64) -> U256 {
    if (multiplier - 1.0).abs() < f64::EPSILON {
        return gas_price;
    }
    let scaled = (multiplier * 1000.0).round() as u64;
    gas_price * U256::from(scaled) / U256::from(1000u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::BundleItem;

    fn test_wallet() -> LocalWallet {
        // anvil 的公开测试私钥
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse::<LocalWallet>()
            .unwrap()
            .with_chain_id(1u64)
    }

    fn test_racer() -> BundleRacer<Provider<Http>> {
        let provider = Arc::new(Provider::<Http>::try_from("http://localhost:8545").unwrap());
        let relay = Arc::new(RelayClient::new("https://relay.flashbots.net", test_wallet()));
        BundleRacer::new(
            provider,
            test_wallet(),
            Some(relay),
            BundleRacerConfig {
                contract_address: Some(Address::repeat_byte(0x42)),
                percentage_to_keep: Some(80),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn test_snapshot() -> RaceSnapshot {
        RaceSnapshot {
            block_number: 17_000_000,
            gas_price: U256::from(30_000_000_000u64),
            nonce: U256::from(7),
        }
    }

    #[test]
    fn test_missing_config_is_fatal() {
        let provider = Arc::new(Provider::<Http>::try_from("http://localhost:8545").unwrap());
        let relay = Arc::new(RelayClient::new("https://relay.flashbots.net", test_wallet()));

        let err = BundleRacer::new(
            provider.clone(),
            test_wallet(),
            Some(relay.clone()),
            BundleRacerConfig {
                percentage_to_keep: Some(80),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, RacerError::MissingConfig("contract_address")));

        let err = BundleRacer::new(
            provider.clone(),
            test_wallet(),
            None,
            BundleRacerConfig {
                contract_address: Some(Address::repeat_byte(0x42)),
                percentage_to_keep: Some(80),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, RacerError::MissingConfig("relay")));

        let err = BundleRacer::new(
            provider,
            test_wallet(),
            Some(relay),
            BundleRacerConfig {
                contract_address: Some(Address::repeat_byte(0x42)),
                percentage_to_keep: Some(120),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, RacerError::InvalidConfig("percentage_to_keep", _)));
    }

    #[test]
    fn test_settlement_tx_uses_snapshot_values() {
        let racer = test_racer();
        let snapshot = test_snapshot();
        let tx = racer.settlement_tx(Address::repeat_byte(1), Address::repeat_byte(2), &snapshot);

        assert_eq!(tx.nonce(), Some(&U256::from(7)));
        assert_eq!(tx.gas_price(), Some(snapshot.gas_price));
        assert_eq!(tx.gas(), Some(&U256::from(400_000)));
        assert_eq!(tx.to_addr(), Some(&Address::repeat_byte(0x42)));
    }

    #[test]
    fn test_opposite_orderings_differ_only_in_calldata() {
        let racer = test_racer();
        let snapshot = test_snapshot();
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);

        let straight = racer.settlement_tx(a, b, &snapshot);
        let reversed = racer.settlement_tx(b, a, &snapshot);

        assert_ne!(straight.data(), reversed.data());
        // 前 4 字节是同一个函数选择器
        assert_eq!(straight.data().unwrap()[..4], reversed.data().unwrap()[..4]);
        assert_eq!(straight.nonce(), reversed.nonce());
    }

    #[tokio::test]
    async fn test_build_bundle_pair() {
        let racer = test_racer();
        let snapshot = test_snapshot();
        let trigger = H256::repeat_byte(0xaa);

        let pair = racer
            .build_bundle_pair(trigger, Address::repeat_byte(1), Address::repeat_byte(2), &snapshot)
            .await
            .unwrap();

        // 顺序相反的两笔签名交易不同
        assert_ne!(pair.straight.signed_tx, pair.reversed.signed_tx);
        assert_eq!(pair.straight.ordering, PoolOrdering::Straight);
        assert_eq!(pair.reversed.ordering, PoolOrdering::Reversed);

        // 两个 bundle 共享同一份快照的目标窗口: [tip+1, tip+1+10]
        assert_eq!(pair.straight.bundle.inclusion.block, "0x1036641");
        assert_eq!(pair.straight.bundle.inclusion.max_block, "0x103664b");
        assert_eq!(pair.straight.bundle.inclusion, pair.reversed.bundle.inclusion);

        for candidate in [&pair.straight, &pair.reversed] {
            assert_eq!(candidate.bundle.version, "beta-1");
            assert_eq!(candidate.bundle.body.len(), 2);
            match &candidate.bundle.body[0] {
                BundleItem::Hash { hash } => assert_eq!(*hash, trigger),
                other => panic!("锚定交易应排在最前: {:?}", other),
            }
            match &candidate.bundle.body[1] {
                BundleItem::Tx { can_revert, .. } => assert!(!can_revert),
                other => panic!("结算交易应在锚定交易之后: {:?}", other),
            }
        }
    }

    #[test]
    fn test_scale_gas_price() {
        let base = U256::from(10_000_000_000u64);
        assert_eq!(scale_gas_price(base, 1.0), base);
        assert_eq!(scale_gas_price(base, 1.2), U256::from(12_000_000_000u64));
        assert_eq!(scale_gas_price(base, 2.0), U256::from(20_000_000_000u64));
    }
}
