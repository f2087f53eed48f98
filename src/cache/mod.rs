//! Time-bounded storage of successful responses.

mod key;
mod store;

pub use key::request_key;
pub use store::{CacheEntry, ResponseCache, SweepStats, SweeperHandle};
