//! # Workers
//!
//! Pool fijo de threads que consumen el canal de requests.

pub mod pool;

pub use pool::{PoolState, PoolStats, WorkerThreadPool, DEFAULT_POOL_SIZE};
