//! Wire codec for the subset of the Kafka protocol the monitor speaks.
//!
//! # References
//! - <https://kafka.apache.org/protocol>

pub mod api_key;
pub mod api_version;
pub mod error;
pub mod frame;
pub mod messages;
pub mod pool;
pub mod primitives;
pub mod traits;

#[cfg(test)]
mod test_utils;
