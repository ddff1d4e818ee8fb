//! 流动性快照文档模型
//!
//! 对应 liquidity_snapshot.json：顶层按池子地址为键，
//! 另含整体市场字段与按池子组织的历史价格点。

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 整个快照文档
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotDocument {
    /// 整体市场流动性
    #[serde(rename = "totalLiquidity", default)]
    pub total_liquidity: Decimal,
    /// 整体日交易量
    #[serde(rename = "dailyVolume", default)]
    pub daily_volume: Decimal,
    /// 按池子地址组织的历史价格点
    #[serde(rename = "historicalData", default)]
    pub historical_data: HashMap<String, Vec<PricePoint>>,
    /// 按池子地址为键的单池快照
    #[serde(flatten)]
    pub pools: HashMap<String, PoolLiquiditySnapshot>,
}

/// 单个池子的流动性快照
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolLiquiditySnapshot {
    pub total_liquidity: Decimal,
    pub reserves: SnapshotReserves,
    pub trade_volume: Decimal,
    #[serde(default)]
    pub daily_volume: Decimal,
}

/// 两侧储备量
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotReserves {
    pub reserve_a: Decimal,
    pub reserve_b: Decimal,
}

/// 历史价格点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub timestamp: i64,
    pub price_change: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_snapshot_document() {
        let raw = r#"{
            "totalLiquidity": 2500000,
            "dailyVolume": 4000000,
            "historicalData": {
                "0xpool1": [
                    {"timestamp": 1700000000, "priceChange": 0.03},
                    {"timestamp": 1700000600, "priceChange": -0.01}
                ]
            },
            "0xpool1": {
                "totalLiquidity": 1200000,
                "reserves": {"reserveA": 60000, "reserveB": 55000},
                "tradeVolume": 80000
            }
        }"#;

        let doc: SnapshotDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.total_liquidity, Decimal::from(2_500_000));
        assert_eq!(doc.historical_data["0xpool1"].len(), 2);

        let pool = &doc.pools["0xpool1"];
        assert_eq!(pool.reserves.reserve_a, Decimal::from(60_000));
        assert_eq!(pool.reserves.reserve_b, Decimal::from(55_000));
    }
}
