mod event_stream;
mod pool_resolver;

pub use event_stream::{EventStream, EventStreamConfig, ReconnectPolicy, StreamState};
pub use pool_resolver::{PoolResolver, PoolResolverConfig};
