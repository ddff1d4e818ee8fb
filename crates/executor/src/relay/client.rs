//! 中继客户端
//!
//! 负责与 bundle 中继通信。每个请求对请求体做 EIP-191 签名认证，
//! 请求 id 在进程内严格递增，并发调用之间不冲突、出错也不回收。
//! 这一层不做重试、超时与退避——传输失败立即返回给调用方，
//! 由竞速器把它当作该 bundle 的终态。

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Result};
use ethers::signers::{LocalWallet, Signer};
use ethers::utils::keccak256;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use utils::record_relay_request;

use super::types::{
    JsonRpcRequest, JsonRpcResponse, MevShareBundle, SendMevBundleResponse, SimMevBundleResponse,
};

/// 中继客户端
#[derive(Debug)]
pub struct RelayClient {
    relay_url: String,
    http: Client,
    /// 认证签名钱包（向中继证明身份，不签署结算交易）
    signer: LocalWallet,
    /// 下一个请求 id
    next_id: AtomicU64,
}

impl RelayClient {
    pub fn new(relay_url: impl Into<String>, signer: LocalWallet) -> Self {
        Self {
            relay_url: relay_url.into(),
            http: Client::new(),
            signer,
            next_id: AtomicU64::new(1),
        }
    }

    /// 提交 bundle
    pub async fn send_bundle(&self, bundle: &MevShareBundle) -> Result<SendMevBundleResponse> {
        self.call("mev_sendBundle", [bundle]).await
    }

    /// 模拟 bundle
    pub async fn sim_bundle(&self, bundle: &MevShareBundle) -> Result<SimMevBundleResponse> {
        self.call("mev_simBundle", [bundle]).await
    }

    /// 发送一次签名请求并解码响应
    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<R> {
        let id = self.allocate_id();
        let body = serde_json::to_string(&JsonRpcRequest::new(id, method, params))?;
        let auth = self.auth_header(&body).await?;

        record_relay_request();
        debug!(target: "relay", "📤 中继请求 id={} method={}: {}", id, method, body);

        let response = self
            .http
            .post(&self.relay_url)
            .header("Content-Type", "application/json")
            .header("X-Flashbots-Signature", auth)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(target: "relay", "📥 中继响应 [{}]: {}", status, text);

        if !status.is_success() {
            return Err(anyhow!("中继请求失败: {} - {}", status, text));
        }

        let decoded: JsonRpcResponse<R> = serde_json::from_str(&text)?;
        if let Some(error) = decoded.error {
            return Err(anyhow!("中继 RPC 错误: {} - {}", error.code, error.message));
        }
        decoded.result.ok_or_else(|| anyhow!("中继响应缺少 result"))
    }

    /// 分配严格递增的请求 id
    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// X-Flashbots-Signature: {签名地址}:{对请求体 keccak256 哈希十六进制串的 EIP-191 签名}
    async fn auth_header(&self, body: &str) -> Result<String> {
        let body_hash = keccak256(body.as_bytes());
        let hash_hex = format!("0x{}", hex::encode(body_hash));
        let signature = self.signer.sign_message(hash_hex.as_bytes()).await?;

        // 确保 v 是 27 或 28
        let mut sig_bytes = signature.to_vec();
        if sig_bytes.len() == 65 && sig_bytes[64] < 27 {
            sig_bytes[64] += 27;
        }

        Ok(format!(
            "0x{}:0x{}",
            hex::encode(self.signer.address().as_bytes()),
            hex::encode(&sig_bytes)
        ))
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn test_client() -> RelayClient {
        // anvil 的公开测试私钥
        let wallet: LocalWallet =
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .parse()
                .unwrap();
        RelayClient::new("https://relay.flashbots.net", wallet)
    }

    #[test]
    fn test_ids_strictly_increase() {
        let client = test_client();
        assert_eq!(client.allocate_id(), 1);
        assert_eq!(client.allocate_id(), 2);
        assert_eq!(client.allocate_id(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_ids_never_collide() {
        let client = Arc::new(test_client());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                (0..25).map(|_| client.allocate_id()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(seen.insert(id), "请求 id 重复分配: {}", id);
            }
        }
        assert_eq!(seen.len(), 200);
        // 下一个 id 紧接在已分配的 id 之后
        assert_eq!(client.allocate_id(), 201);
    }

    #[tokio::test]
    async fn test_auth_header_format() {
        let client = test_client();
        let header = client.auth_header(r#"{"id":1}"#).await.unwrap();

        let (address, signature) = header.split_once(':').unwrap();
        // anvil 测试私钥对应的地址
        assert_eq!(address, "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert!(signature.starts_with("0x"));
        // 65 字节签名的十六进制
        assert_eq!(signature.len(), 2 + 65 * 2);
        // v 已规范化为 27/28
        let v = u8::from_str_radix(&signature[signature.len() - 2..], 16).unwrap();
        assert!(v == 27 || v == 28);
    }
}
