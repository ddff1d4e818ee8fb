use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use url::Url;

/// 运行网络
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Goerli,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Goerli => "goerli",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Goerli => 5,
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "goerli" => Ok(Network::Goerli),
            other => Err(format!("不支持的网络: {other} (可选: mainnet, goerli)")),
        }
    }
}

/// 每个网络的内置地址与服务端点
#[derive(Debug, Clone)]
pub struct NetworkEndpoints {
    /// Uniswap V2 Factory
    pub uniswap_factory: String,
    /// SushiSwap Factory
    pub sushi_factory: String,
    /// 基准资产 (Wrapped Native Token)
    pub weth: String,
    /// bundle 中继 URL
    pub relay_url: String,
    /// MEV-Share 事件流 URL
    pub matchmaker_url: String,
}

impl NetworkEndpoints {
    /// 以太坊主网端点
    pub fn mainnet() -> Self {
        Self {
            uniswap_factory: "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f".to_string(),
            sushi_factory: "0xC0AEe478e3658e2610c5F7A4A2E1777cE9e4f2Ac".to_string(),
            weth: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".to_string(),
            relay_url: "https://relay.flashbots.net".to_string(),
            matchmaker_url: "https://mev-share.flashbots.net".to_string(),
        }
    }

    /// Goerli 测试网端点
    pub fn goerli() -> Self {
        Self {
            uniswap_factory: "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f".to_string(),
            sushi_factory: "0xc35DADB65012eC5796536bD9864eD8773aBc74C4".to_string(),
            weth: "0xB4FBF271143F4FBf7B91A5ded31805e42b2208d6".to_string(),
            relay_url: "https://relay-goerli.flashbots.net".to_string(),
            matchmaker_url: "https://mev-share-goerli.flashbots.net".to_string(),
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Goerli => Self::goerli(),
        }
    }
}

/// 事件流配置
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// 重连前的固定等待秒数
    pub reconnect_delay_secs: u64,
}

/// 竞速器配置
#[derive(Debug, Clone)]
pub struct RacerSettings {
    /// 目标区块窗口宽度
    pub blocks_to_try: u64,
    /// 结算交易 gas 上限
    pub gas_limit: u64,
    /// 快照 gas 价格的放大系数
    pub gas_price_multiplier: f64,
    /// 单个 bundle 的提交期限 (秒)
    pub submit_timeout_secs: u64,
}

/// 应用配置
///
/// 必要项缺失是启动期致命错误，进程不应继续服务事件。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub network: Network,
    pub rpc_url: String,
    pub private_key: String,
    /// 链上回跑结算合约地址
    pub executor_contract: String,
    /// 留存利润百分比 (1-100)
    pub percentage_to_keep: u64,
    pub endpoints: NetworkEndpoints,
    /// 流动性快照事件流 URL (可选)
    pub snapshot_stream_url: Option<String>,
    /// 流动性快照文件路径
    pub snapshot_file: String,
    pub stream: StreamSettings,
    pub racer: RacerSettings,
}

impl AppConfig {
    pub fn load(network: Network) -> Result<Self> {
        // 加载 .env 文件
        dotenv::dotenv().ok();

        let rpc_url = env::var("RPC_URL").context("RPC_URL not set")?;
        let private_key = env::var("PRIVATE_KEY").context("PRIVATE_KEY not set")?;
        let executor_contract =
            env::var("EXECUTOR_CONTRACT_ADDRESS").context("EXECUTOR_CONTRACT_ADDRESS not set")?;

        let percentage_to_keep: u64 = env::var("PERCENTAGE_TO_KEEP")
            .unwrap_or_else(|_| "80".to_string())
            .parse()
            .context("Invalid PERCENTAGE_TO_KEEP")?;
        if percentage_to_keep == 0 || percentage_to_keep > 100 {
            bail!("PERCENTAGE_TO_KEEP 必须在 1..=100 之间: {}", percentage_to_keep);
        }

        // 内置端点可被环境变量覆盖
        let mut endpoints = NetworkEndpoints::for_network(network);
        if let Some(relay) = env::var("RELAY_URL").ok().filter(|s| !s.is_empty()) {
            endpoints.relay_url = relay;
        }
        if let Some(matchmaker) = env::var("MATCHMAKER_URL").ok().filter(|s| !s.is_empty()) {
            endpoints.matchmaker_url = matchmaker;
        }

        Url::parse(&rpc_url).context("Invalid RPC_URL")?;
        Url::parse(&endpoints.relay_url).context("Invalid RELAY_URL")?;
        Url::parse(&endpoints.matchmaker_url).context("Invalid MATCHMAKER_URL")?;

        let snapshot_stream_url = env::var("SNAPSHOT_STREAM_URL").ok().filter(|s| !s.is_empty());
        if let Some(url) = &snapshot_stream_url {
            Url::parse(url).context("Invalid SNAPSHOT_STREAM_URL")?;
        }

        let stream = StreamSettings {
            reconnect_delay_secs: env::var("STREAM_RECONNECT_DELAY_SECS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("Invalid STREAM_RECONNECT_DELAY_SECS")?,
        };

        let racer = RacerSettings {
            blocks_to_try: env::var("BLOCKS_TO_TRY")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid BLOCKS_TO_TRY")?,
            gas_limit: env::var("GAS_LIMIT")
                .unwrap_or_else(|_| "400000".to_string())
                .parse()
                .context("Invalid GAS_LIMIT")?,
            gas_price_multiplier: env::var("GAS_PRICE_MULTIPLIER")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()
                .context("Invalid GAS_PRICE_MULTIPLIER")?,
            submit_timeout_secs: env::var("SUBMIT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid SUBMIT_TIMEOUT_SECS")?,
        };

        Ok(Self {
            network,
            rpc_url,
            private_key,
            executor_contract,
            percentage_to_keep,
            endpoints,
            snapshot_stream_url,
            snapshot_file: env::var("SNAPSHOT_FILE")
                .unwrap_or_else(|_| "./liquidity_snapshot.json".to_string()),
            stream,
            racer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_str() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("Goerli".parse::<Network>().unwrap(), Network::Goerli);
        assert!("sepolia".parse::<Network>().is_err());
    }

    #[test]
    fn test_network_chain_id() {
        assert_eq!(Network::Mainnet.chain_id(), 1);
        assert_eq!(Network::Goerli.chain_id(), 5);
    }

    #[test]
    fn test_endpoints_for_network() {
        let mainnet = NetworkEndpoints::for_network(Network::Mainnet);
        assert_eq!(mainnet.relay_url, "https://relay.flashbots.net");
        assert_eq!(mainnet.matchmaker_url, "https://mev-share.flashbots.net");

        let goerli = NetworkEndpoints::for_network(Network::Goerli);
        assert_eq!(goerli.relay_url, "https://relay-goerli.flashbots.net");
        assert_ne!(mainnet.weth, goerli.weth);
    }
}
