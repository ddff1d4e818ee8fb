//! 回跑策略与外围流动性分析

mod backrun_strategy;
mod snapshot_analyzer;

pub use backrun_strategy::BackrunStrategy;
pub use snapshot_analyzer::{
    LiquidityAnalysis, MarketConditions, SnapshotAnalyzer, TrendAnalysis,
};
