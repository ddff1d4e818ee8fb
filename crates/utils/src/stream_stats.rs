//! 事件流与中继请求统计
//!
//! 进程级计数器，统计事件流吞吐、重连次数与中继请求量。

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// 滑动窗口计数器
struct TimeWindowCounter {
    /// 最近一分钟内的时间戳队列
    timestamps: RwLock<VecDeque<Instant>>,
    /// 总计数
    total: AtomicU64,
}

impl TimeWindowCounter {
    fn new() -> Self {
        Self {
            timestamps: RwLock::new(VecDeque::with_capacity(1024)),
            total: AtomicU64::new(0),
        }
    }

    /// 记录一次事件
    fn record(&self) {
        let now = Instant::now();
        self.total.fetch_add(1, Ordering::Relaxed);

        let mut timestamps = self.timestamps.write();
        timestamps.push_back(now);

        // 清理超过一分钟的旧时间戳
        let one_minute_ago = now - Duration::from_secs(60);
        while let Some(front) = timestamps.front() {
            if *front < one_minute_ago {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn last_minute(&self) -> u64 {
        let one_minute_ago = Instant::now() - Duration::from_secs(60);
        let timestamps = self.timestamps.read();
        timestamps.iter().rev().take_while(|ts| **ts >= one_minute_ago).count() as u64
    }

    fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

/// 进程级统计器
struct StreamStats {
    start_time: Instant,
    /// 分发的事件
    events: TimeWindowCounter,
    /// 事件流重连
    reconnects: TimeWindowCounter,
    /// 中继请求
    relay_requests: TimeWindowCounter,
}

impl StreamStats {
    fn new() -> Self {
        Self {
            start_time: Instant::now(),
            events: TimeWindowCounter::new(),
            reconnects: TimeWindowCounter::new(),
            relay_requests: TimeWindowCounter::new(),
        }
    }

    fn snapshot(&self) -> StreamStatsSnapshot {
        StreamStatsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            events_last_minute: self.events.last_minute(),
            events_total: self.events.total(),
            reconnects_total: self.reconnects.total(),
            relay_requests_total: self.relay_requests.total(),
        }
    }
}

/// 统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamStatsSnapshot {
    pub uptime_secs: u64,
    pub events_last_minute: u64,
    pub events_total: u64,
    pub reconnects_total: u64,
    pub relay_requests_total: u64,
}

static STATS: Lazy<StreamStats> = Lazy::new(StreamStats::new);

/// 记录一次事件分发
pub fn record_stream_event() {
    STATS.events.record();
}

/// 记录一次事件流重连
pub fn record_reconnect() {
    STATS.reconnects.record();
}

/// 记录一次中继请求
pub fn record_relay_request() {
    STATS.relay_requests.record();
}

/// 获取统计快照
pub fn get_stream_stats() -> StreamStatsSnapshot {
    STATS.snapshot()
}

/// 输出一行统计汇总
pub fn log_stream_stats() {
    let stats = get_stream_stats();
    info!(
        "📊 运行 {}s | 事件 {} (近1分钟 {}) | 重连 {} | 中继请求 {}",
        stats.uptime_secs,
        stats.events_total,
        stats.events_last_minute,
        stats.reconnects_total,
        stats.relay_requests_total,
    );
}
