use thiserror::Error;

use crate::config::ConfigError;
use crate::connection::topology::BrokerTopology;

pub use crate::protocol::error::Error as ProtocolError;

/// Which request a [`Error::ServerError`] answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestContext {
    ListGroups,

    /// Committed offsets of a group.
    Group(String),
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection error: {0}")]
    Connection(#[from] crate::connection::Error),

    #[error("None of the {} seed brokers is reachable, last error: {last}", .seeds.len())]
    NoReachableSeed {
        seeds: Vec<String>,
        #[source]
        last: crate::connection::Error,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Broker list changed from {expected} to {found}")]
    TopologyDrift {
        expected: BrokerTopology,
        found: BrokerTopology,
    },

    #[error("Server error {protocol_error:?}, context: {request:?}")]
    ServerError {
        protocol_error: ProtocolError,
        request: RequestContext,
    },

    #[error("Broker {node_id} failed: {source}")]
    BrokerTask {
        node_id: i32,
        #[source]
        source: Box<Error>,
    },

    #[error("Broker task panicked or was cancelled: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
