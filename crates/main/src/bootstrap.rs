//! 应用启动引导模块
//!
//! 封装配置加载、服务装配与关闭逻辑。

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config_crate::{AppConfig, Network};
use dex::UniswapV2PairReader;
use ethers::prelude::*;
use ethers::signers::LocalWallet;
use executor::{BundleRacer, BundleRacerConfig, RelayClient};
use services::{
    EventStream, EventStreamConfig, PoolResolver, PoolResolverConfig, ReconnectPolicy,
};
use strategies::{BackrunStrategy, SnapshotAnalyzer};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use ::utils::log_stream_stats;

/// 统计汇总输出间隔
const STATS_LOG_INTERVAL_SECS: u64 = 60;

/// 应用程序实例
///
/// 管理事件流、策略任务与统计任务的生命周期。
pub struct Application {
    matchmaker: Arc<EventStream>,
    snapshot_stream: Option<Arc<EventStream>>,
    stream_handles: Vec<JoinHandle<()>>,
    strategy_handle: JoinHandle<()>,
    stats_handle: JoinHandle<()>,
}

impl Application {
    /// 初始化并启动全部服务
    pub async fn start(network: Network) -> Result<Self> {
        info!("加载 {} 配置...", network.name());
        let config = AppConfig::load(network)?;
        Self::log_config(&config);

        // 启动时如有流动性快照文件，输出一次整体市场状态
        match SnapshotAnalyzer::load(&config.snapshot_file) {
            Ok(analyzer) => info!("市场状态: {:?}", analyzer.market_conditions()),
            Err(e) => debug!("跳过流动性快照分析: {e:#}"),
        }

        // Provider 与签名钱包
        let provider = Arc::new(
            Provider::<Http>::try_from(config.rpc_url.as_str()).context("创建 RPC Provider 失败")?,
        );
        let wallet: LocalWallet = config
            .private_key
            .parse::<LocalWallet>()
            .context("解析 PRIVATE_KEY 失败")?
            .with_chain_id(network.chain_id());
        info!("钱包已加载: {:?}", wallet.address());

        // 中继客户端与竞速器
        let relay = Arc::new(RelayClient::new(
            config.endpoints.relay_url.clone(),
            wallet.clone(),
        ));
        let contract_address = Address::from_str(&config.executor_contract)
            .context("解析 EXECUTOR_CONTRACT_ADDRESS 失败")?;
        let racer = Arc::new(BundleRacer::new(
            provider.clone(),
            wallet,
            Some(relay),
            BundleRacerConfig {
                contract_address: Some(contract_address),
                percentage_to_keep: Some(config.percentage_to_keep),
                blocks_to_try: config.racer.blocks_to_try,
                gas_limit: config.racer.gas_limit,
                gas_price_multiplier: config.racer.gas_price_multiplier,
                submit_deadline: Duration::from_secs(config.racer.submit_timeout_secs),
            },
        )?);

        // 池子解析器
        let resolver = Arc::new(PoolResolver::new(
            UniswapV2PairReader::new(provider),
            PoolResolverConfig {
                base_asset: Address::from_str(&config.endpoints.weth)
                    .context("解析基准资产地址失败")?,
                uniswap_factory: Address::from_str(&config.endpoints.uniswap_factory)
                    .context("解析 Uniswap Factory 地址失败")?,
                sushi_factory: Address::from_str(&config.endpoints.sushi_factory)
                    .context("解析 Sushi Factory 地址失败")?,
            },
        ));

        // 事件流
        let reconnect = ReconnectPolicy::fixed(Duration::from_secs(config.stream.reconnect_delay_secs));
        let matchmaker = Arc::new(EventStream::new(EventStreamConfig {
            url: config.endpoints.matchmaker_url.clone(),
            reconnect: reconnect.clone(),
        }));
        let snapshot_stream = config.snapshot_stream_url.as_ref().map(|url| {
            Arc::new(EventStream::new(EventStreamConfig {
                url: url.clone(),
                reconnect,
            }))
        });

        let mut stream_handles = Vec::new();
        {
            let stream = matchmaker.clone();
            stream_handles.push(tokio::spawn(async move { stream.run().await }));
        }
        if let Some(stream) = &snapshot_stream {
            let stream = stream.clone();
            stream_handles.push(tokio::spawn(async move { stream.run().await }));
        }

        // 策略任务
        let strategy = Arc::new(BackrunStrategy::new(
            matchmaker.clone(),
            snapshot_stream.clone(),
            resolver,
            racer,
        ));
        let strategy_handle = tokio::spawn(async move { strategy.run().await });

        // 统计汇总任务
        let stats_handle = tokio::spawn(async {
            let mut interval =
                tokio::time::interval(Duration::from_secs(STATS_LOG_INTERVAL_SECS));
            interval.tick().await;
            loop {
                interval.tick().await;
                log_stream_stats();
            }
        });

        info!("全部服务已启动");

        Ok(Self {
            matchmaker,
            snapshot_stream,
            stream_handles,
            strategy_handle,
            stats_handle,
        })
    }

    /// 阻塞等待退出信号
    pub async fn wait_for_shutdown(&self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("监听退出信号失败: {e}");
        }
        info!("收到退出信号");
    }

    /// 关闭事件流并回收后台任务
    pub async fn shutdown(self) -> Result<()> {
        self.matchmaker.close().await;
        if let Some(stream) = &self.snapshot_stream {
            stream.close().await;
        }

        for handle in self.stream_handles {
            let _ = handle.await;
        }
        let _ = self.strategy_handle.await;
        self.stats_handle.abort();

        info!("应用已退出");
        Ok(())
    }

    fn log_config(config: &AppConfig) {
        info!("网络: {}", config.network.name());
        info!("RPC: {}", config.rpc_url);
        info!("中继: {}", config.endpoints.relay_url);
        info!("事件流: {}", config.endpoints.matchmaker_url);
        info!("结算合约: {}", config.executor_contract);
        info!("留存利润: {}%", config.percentage_to_keep);
        info!(
            "竞速参数: window={} blocks, gas_limit={}, gas_multiplier={}",
            config.racer.blocks_to_try, config.racer.gas_limit, config.racer.gas_price_multiplier
        );
    }
}

pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("========================================");
        error!("!!! 系统发生 PANIC !!!");
        error!("========================================");
        error!("Panic 信息: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            error!(
                "发生位置: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
        error!("========================================");
    }));
}
