//! 流动性快照分析
//!
//! 读取 liquidity_snapshot.json，对单个池子的流动性、储备平衡与交易量
//! 做阈值判定，并结合历史价格点与整体流动性/交易量比率评估市场状态。
//! 属于离线分析路径，不在事件热路径上。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use models::{PoolLiquiditySnapshot, PricePoint, SnapshotDocument};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

/// 高流动性阈值
const HIGH_LIQUIDITY: Decimal = dec!(1_000_000);
/// 储备平衡允许的最大差值
const BALANCED_RESERVE_GAP: Decimal = dec!(10_000);
/// 显著交易量阈值
const SIGNIFICANT_TRADE_VOLUME: Decimal = dec!(50_000);
/// 流动性/日交易量比率超过该值视为高波动
const HIGH_VOLATILITY_RATIO: Decimal = dec!(0.5);

/// 单个池子的流动性判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityAnalysis {
    pub is_high_liquidity: bool,
    pub is_balanced_reserves: bool,
    pub is_significant_trade_volume: bool,
}

/// 历史趋势判定结果
#[derive(Debug, Clone, PartialEq)]
pub struct TrendAnalysis {
    pub is_upward: bool,
    /// 指定时间点的价格点，不存在则为 None
    pub at: Option<PricePoint>,
}

/// 市场状态判定结果
#[derive(Debug, Clone, PartialEq)]
pub struct MarketConditions {
    pub is_volatility_high: bool,
    pub liquidity_to_volume_ratio: Decimal,
    pub total_liquidity: Decimal,
    pub daily_volume: Decimal,
}

/// 快照文件分析器
pub struct SnapshotAnalyzer {
    document: SnapshotDocument,
}

impl SnapshotAnalyzer {
    /// 读取并解析快照文件
    ///
    /// 这是运维主动调用的分析入口，文件不可读或格式错误直接向调用方传播。
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("读取快照文件失败: {}", path.display()))?;
        let document: SnapshotDocument = serde_json::from_str(&raw)
            .with_context(|| format!("解析快照文件失败: {}", path.display()))?;
        Ok(Self { document })
    }

    pub fn from_document(document: SnapshotDocument) -> Self {
        Self { document }
    }

    /// 按池子地址取快照数据
    pub fn fetch_for_pool(&self, pool: &str) -> Option<&PoolLiquiditySnapshot> {
        self.document.pools.get(pool)
    }

    /// 对单个池子的快照做阈值判定
    pub fn analyze(snapshot: &PoolLiquiditySnapshot) -> LiquidityAnalysis {
        let gap = (snapshot.reserves.reserve_a - snapshot.reserves.reserve_b).abs();
        LiquidityAnalysis {
            is_high_liquidity: snapshot.total_liquidity > HIGH_LIQUIDITY,
            is_balanced_reserves: gap < BALANCED_RESERVE_GAP,
            is_significant_trade_volume: snapshot.trade_volume > SIGNIFICANT_TRADE_VOLUME,
        }
    }

    /// 指定时间点的历史趋势；没有对应价格点时视为非上行
    pub fn historical_trend(&self, pool: &str, timestamp: i64) -> TrendAnalysis {
        let at = self
            .document
            .historical_data
            .get(pool)
            .and_then(|points| points.iter().find(|p| p.timestamp == timestamp))
            .cloned();

        TrendAnalysis {
            is_upward: at
                .as_ref()
                .map(|p| p.price_change > Decimal::ZERO)
                .unwrap_or(false),
            at,
        }
    }

    /// 整体市场状态
    pub fn market_conditions(&self) -> MarketConditions {
        let total_liquidity = self.document.total_liquidity;
        let daily_volume = self.document.daily_volume;
        let ratio = if daily_volume.is_zero() {
            Decimal::ZERO
        } else {
            total_liquidity / daily_volume
        };

        MarketConditions {
            is_volatility_high: ratio > HIGH_VOLATILITY_RATIO,
            liquidity_to_volume_ratio: ratio,
            total_liquidity,
            daily_volume,
        }
    }

    /// 汇总日志输出
    pub fn log_report(&self, pool: &str, timestamp: i64) {
        if let Some(snapshot) = self.fetch_for_pool(pool) {
            info!("池子 {} 分析: {:?}", pool, Self::analyze(snapshot));
        } else {
            info!("快照中没有池子 {} 的数据", pool);
        }

        let trend = self.historical_trend(pool, timestamp);
        if let Some(at) = &trend.at {
            let when = DateTime::from_timestamp(at.timestamp, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            info!("历史趋势 @ {}: upward={}", when, trend.is_upward);
        }

        info!("市场状态: {:?}", self.market_conditions());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::SnapshotReserves;

    fn sample_document() -> SnapshotDocument {
        serde_json::from_str(
            r#"{
                "totalLiquidity": 3000000,
                "dailyVolume": 4000000,
                "historicalData": {
                    "0xpool1": [
                        {"timestamp": 1700000000, "priceChange": 0.05},
                        {"timestamp": 1700000600, "priceChange": -0.02}
                    ]
                },
                "0xpool1": {
                    "totalLiquidity": 1500000,
                    "reserves": {"reserveA": 62000, "reserveB": 58000},
                    "tradeVolume": 90000
                },
                "0xpool2": {
                    "totalLiquidity": 200000,
                    "reserves": {"reserveA": 90000, "reserveB": 20000},
                    "tradeVolume": 1000
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_analyze_thresholds() {
        let analyzer = SnapshotAnalyzer::from_document(sample_document());

        let rich = analyzer.fetch_for_pool("0xpool1").unwrap();
        let analysis = SnapshotAnalyzer::analyze(rich);
        assert!(analysis.is_high_liquidity);
        assert!(analysis.is_balanced_reserves);
        assert!(analysis.is_significant_trade_volume);

        let poor = analyzer.fetch_for_pool("0xpool2").unwrap();
        let analysis = SnapshotAnalyzer::analyze(poor);
        assert!(!analysis.is_high_liquidity);
        assert!(!analysis.is_balanced_reserves);
        assert!(!analysis.is_significant_trade_volume);
    }

    #[test]
    fn test_analyze_gap_is_symmetric() {
        let snapshot = PoolLiquiditySnapshot {
            total_liquidity: dec!(2_000_000),
            reserves: SnapshotReserves {
                reserve_a: dec!(1_000),
                reserve_b: dec!(8_000),
            },
            trade_volume: dec!(60_000),
            daily_volume: Decimal::ZERO,
        };
        assert!(SnapshotAnalyzer::analyze(&snapshot).is_balanced_reserves);
    }

    #[test]
    fn test_fetch_unknown_pool() {
        let analyzer = SnapshotAnalyzer::from_document(sample_document());
        assert!(analyzer.fetch_for_pool("0xmissing").is_none());
    }

    #[test]
    fn test_historical_trend() {
        let analyzer = SnapshotAnalyzer::from_document(sample_document());

        let up = analyzer.historical_trend("0xpool1", 1_700_000_000);
        assert!(up.is_upward);
        assert_eq!(up.at.unwrap().price_change, dec!(0.05));

        let down = analyzer.historical_trend("0xpool1", 1_700_000_600);
        assert!(!down.is_upward);

        let missing = analyzer.historical_trend("0xpool1", 42);
        assert!(!missing.is_upward);
        assert!(missing.at.is_none());
    }

    #[test]
    fn test_market_conditions() {
        let analyzer = SnapshotAnalyzer::from_document(sample_document());
        let conditions = analyzer.market_conditions();

        assert_eq!(conditions.liquidity_to_volume_ratio, dec!(0.75));
        assert!(conditions.is_volatility_high);
    }

    #[test]
    fn test_market_conditions_zero_volume() {
        let analyzer = SnapshotAnalyzer::from_document(SnapshotDocument::default());
        let conditions = analyzer.market_conditions();
        assert_eq!(conditions.liquidity_to_volume_ratio, Decimal::ZERO);
        assert!(!conditions.is_volatility_high);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(SnapshotAnalyzer::load("/nonexistent/liquidity_snapshot.json").is_err());
    }
}
