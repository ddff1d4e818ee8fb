use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// 已确认与基准资产配对的池子记录
///
/// 只有 token0/token1 之一等于基准资产的池子才会被物化，
/// 记录创建后不可变，在进程生命周期内缓存。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    /// 池子自身所属的工厂
    pub factory: Address,
}

impl PoolRecord {
    /// 是否包含指定的基准资产
    pub fn pairs_with(&self, base_asset: Address) -> bool {
        self.token0 == base_asset || self.token1 == base_asset
    }

    /// 返回与基准资产配对的另一侧代币
    pub fn counter_token(&self, base_asset: Address) -> Address {
        if self.token0 == base_asset {
            self.token1
        } else {
            self.token0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_token() {
        let base = Address::repeat_byte(0xee);
        let other = Address::repeat_byte(0x11);
        let record = PoolRecord {
            address: Address::repeat_byte(0x01),
            token0: base,
            token1: other,
            factory: Address::repeat_byte(0xfa),
        };

        assert!(record.pairs_with(base));
        assert_eq!(record.counter_token(base), other);

        let flipped = PoolRecord {
            token0: other,
            token1: base,
            ..record
        };
        assert_eq!(flipped.counter_token(base), other);
    }
}
