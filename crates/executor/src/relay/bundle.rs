//! MEV-Share bundle 构建器

use ethers::types::{Bytes, H256};

use super::types::{BundleItem, Inclusion, MevShareBundle, PROTOCOL_VERSION};

/// bundle 构建器
///
/// 锚定交易排在最前，之后是签名的结算交易；
/// 结算交易一律 canRevert=false。
#[derive(Debug, Clone, Default)]
pub struct MevBundleBuilder {
    /// 锚定的触发交易哈希
    anchor: Option<H256>,
    /// 签名后的结算交易
    txs: Vec<Bytes>,
    /// 窗口起始区块
    inclusion_block: u64,
    /// 窗口宽度
    blocks_to_try: u64,
}

impl MevBundleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置锚定交易；它回滚时整个 bundle 必须被中继拒绝，不得部分执行
    pub fn anchor_transaction(mut self, hash: H256) -> Self {
        self.anchor = Some(hash);
        self
    }

    /// 追加签名后的结算交易
    pub fn push_transaction(mut self, signed_tx: Bytes) -> Self {
        self.txs.push(signed_tx);
        self
    }

    /// 目标区块窗口：[block, block + blocks_to_try] 闭区间
    pub fn inclusion_window(mut self, block: u64, blocks_to_try: u64) -> Self {
        self.inclusion_block = block;
        self.blocks_to_try = blocks_to_try;
        self
    }

    /// 构建 bundle
    pub fn build(self) -> MevShareBundle {
        let mut body = Vec::with_capacity(self.txs.len() + 1);
        if let Some(hash) = self.anchor {
            body.push(BundleItem::Hash { hash });
        }
        body.extend(self.txs.iter().map(|tx| BundleItem::Tx {
            tx: format!("0x{}", hex::encode(tx)),
            can_revert: false,
        }));

        MevShareBundle {
            version: PROTOCOL_VERSION.to_string(),
            inclusion: Inclusion {
                block: format!("0x{:x}", self.inclusion_block),
                max_block: format!("0x{:x}", self.inclusion_block + self.blocks_to_try),
            },
            body,
        }
    }

    /// 结算交易数量
    pub fn tx_count(&self) -> usize {
        self.txs.len()
    }
}
