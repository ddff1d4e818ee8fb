//! MEV-Share 中继通信
//!
//! 中继接受 bundle 而不是公开交易，提供模拟与打包两个入口，
//! 每个请求都要求签名认证。
//!
//! - `client`: 签名请求传输
//! - `bundle`: bundle 构建器
//! - `types`: 协议类型定义

mod bundle;
mod client;
mod types;

pub use bundle::MevBundleBuilder;
pub use client::RelayClient;
pub use types::{
    BundleItem, Inclusion, JsonRpcError, JsonRpcRequest, JsonRpcResponse, MevShareBundle,
    SendMevBundleResponse, SimMevBundleResponse, PROTOCOL_VERSION,
};
