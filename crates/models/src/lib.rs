mod arbitrage;
mod event;
mod pool;
mod snapshot;

pub use arbitrage::ArbitrageCandidate;
pub use event::{
    LiquiditySnapshotEvent, PendingTransaction, TransactionLog, LIQUIDITY_SNAPSHOT_EVENT,
    PENDING_TRANSACTION_EVENT,
};
pub use pool::PoolRecord;
pub use snapshot::{PoolLiquiditySnapshot, PricePoint, SnapshotDocument, SnapshotReserves};
