//! Uniswap V2 合约 ABI 绑定

use ethers::prelude::*;
use ethers::types::H256;

// Uniswap V2 Pair ABI (只绑定管线用到的方法)
abigen!(
    UniswapV2Pair,
    r#"[
        function token0() external view returns (address)
        function token1() external view returns (address)
        function factory() external view returns (address)
        event Sync(uint112 reserve0, uint112 reserve1)
    ]"#
);

// Uniswap V2 Factory ABI
abigen!(
    UniswapV2Factory,
    r#"[
        function getPair(address tokenA, address tokenB) external view returns (address pair)
    ]"#
);

lazy_static::lazy_static! {
    /// Uniswap V2 `Sync` 事件的 topic0
    ///
    /// 任何储备量变化 (swap/mint/burn) 都会发出 Sync，
    /// 管线以此识别日志中出现的 V2 池子。
    pub static ref SYNC_TOPIC: H256 = H256::from(ethers::utils::keccak256("Sync(uint112,uint112)"));
}
