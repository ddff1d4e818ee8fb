//! 池子与工厂的链上读取接口

use anyhow::Result;
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::Address;
use std::sync::Arc;

use crate::uniswap_v2::{UniswapV2Factory, UniswapV2Pair};

/// 池子与工厂合约的同步读取接口
///
/// 抽象出这一层是为了让上层的分类逻辑不直接依赖具体 Provider。
#[async_trait]
pub trait PairReader: Send + Sync {
    /// 读取池子的 token0/token1 及其所属工厂
    async fn pool_metadata(&self, pool: Address) -> Result<(Address, Address, Address)>;

    /// 查询工厂中指定代币对的池子地址，零地址表示不存在
    async fn pair_for(&self, factory: Address, token_a: Address, token_b: Address)
        -> Result<Address>;
}

/// 基于 ethers Provider 的 Uniswap V2 读取实现
pub struct UniswapV2PairReader<M> {
    provider: Arc<M>,
}

impl<M: Middleware + 'static> UniswapV2PairReader<M> {
    pub fn new(provider: Arc<M>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<M: Middleware + 'static> PairReader for UniswapV2PairReader<M> {
    async fn pool_metadata(&self, pool: Address) -> Result<(Address, Address, Address)> {
        let pair = UniswapV2Pair::new(pool, self.provider.clone());

        // 三个只读调用并发发出
        let token0 = pair.token_0();
        let token1 = pair.token_1();
        let factory = pair.factory();
        let (token0, token1, factory) =
            tokio::try_join!(token0.call(), token1.call(), factory.call())?;

        Ok((token0, token1, factory))
    }

    async fn pair_for(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address> {
        let factory = UniswapV2Factory::new(factory, self.provider.clone());
        let pair = factory.get_pair(token_a, token_b).call().await?;
        Ok(pair)
    }
}
