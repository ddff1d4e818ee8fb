mod logger;
mod stream_stats;

pub use logger::LoggerManager;
pub use stream_stats::{
    get_stream_stats, log_stream_stats, record_reconnect, record_relay_request,
    record_stream_event, StreamStatsSnapshot,
};
