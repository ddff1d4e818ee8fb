//! 池子分类与镜像解析
//!
//! 判定一个池子是否与基准资产配对，并在另一个交易所的工厂中查找
//! 同一代币对的镜像池。任何链上读取失败都降级为"无机会"结果，
//! 单个异常池子不会中断后续事件的处理。

use dashmap::DashMap;
use dex::PairReader;
use ethers::types::Address;
use models::PoolRecord;
use tracing::{debug, info, warn};

/// 解析器配置
#[derive(Debug, Clone)]
pub struct PoolResolverConfig {
    /// 基准资产地址 (WETH)
    pub base_asset: Address,
    pub uniswap_factory: Address,
    pub sushi_factory: Address,
}

/// 池子解析器
pub struct PoolResolver<R> {
    reader: R,
    config: PoolResolverConfig,
    /// 进程生命周期内的池子缓存，只增不减，容量以观察到的池子数为界
    pools: DashMap<Address, PoolRecord>,
}

impl<R: PairReader> PoolResolver<R> {
    pub fn new(reader: R, config: PoolResolverConfig) -> Self {
        info!(
            "池子解析器就绪: base={:?}, uniswap={:?}, sushi={:?}",
            config.base_asset, config.uniswap_factory, config.sushi_factory
        );
        Self {
            reader,
            config,
            pools: DashMap::new(),
        }
    }

    /// 分类池子：与基准资产配对则缓存并返回记录，否则返回 None
    ///
    /// 非基准资产的池子不做负缓存——交易所成员只会因新部署而变化，
    /// 重复查询的代价可以接受。
    pub async fn resolve_pool(&self, address: Address) -> Option<PoolRecord> {
        if let Some(record) = self.pools.get(&address) {
            debug!("池子缓存命中: {:?}", address);
            return Some(*record);
        }

        let (token0, token1, factory) = match self.reader.pool_metadata(address).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("读取池子 {:?} 失败: {e:#}", address);
                return None;
            }
        };

        if token0 != self.config.base_asset && token1 != self.config.base_asset {
            debug!("池子 {:?} 不是基准资产交易对", address);
            return None;
        }

        let record = PoolRecord {
            address,
            token0,
            token1,
            factory,
        };
        // 并发解析同一地址时写入幂等，同值覆盖
        self.pools.insert(address, record);
        info!("发现基准资产池: {:?} (factory {:?})", address, factory);
        Some(record)
    }

    /// 池子自身工厂之外的另一个交易所工厂
    pub fn alternate_factory(&self, factory: Address) -> Address {
        if factory == self.config.uniswap_factory {
            self.config.sushi_factory
        } else {
            self.config.uniswap_factory
        }
    }

    /// 在指定工厂中查找同一代币对的池子
    ///
    /// 零地址表示不存在；读取失败同样按不存在处理，不向调用方抛错。
    pub async fn resolve_mirror(
        &self,
        factory: Address,
        token0: Address,
        token1: Address,
    ) -> Option<Address> {
        match self.reader.pair_for(factory, token0, token1).await {
            Ok(pair) if pair == Address::zero() => {
                debug!("工厂 {:?} 中不存在该代币对的镜像池", factory);
                None
            }
            Ok(pair) => {
                info!("镜像池存在: {:?} (factory {:?})", pair, factory);
                Some(pair)
            }
            Err(e) => {
                warn!("查询工厂 {:?} 失败: {e:#}", factory);
                None
            }
        }
    }

    /// 已缓存的池子数量
    pub fn cached_pools(&self) -> usize {
        self.pools.len()
    }
}
