//! Uniswap V2 风格合约的绑定与链上读取
//!
//! ## 模块结构
//!
//! - `uniswap_v2`: Pair/Factory ABI 绑定与事件 topic 常量
//! - `reader`: 池子/工厂读取接口及基于 ethers Provider 的实现

pub mod uniswap_v2;
mod reader;

pub use reader::{PairReader, UniswapV2PairReader};
pub use uniswap_v2::{UniswapV2Factory, UniswapV2Pair, SYNC_TOPIC};
