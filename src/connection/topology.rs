use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::protocol::messages::MetadataResponseBroker;

/// Brokers advertised by the cluster at one point in time, sorted by ID.
///
/// Taken once per discovery and compared against fresh metadata on every poll. Never updated in
/// place: a different broker list is a different topology.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerTopology(Vec<Broker>);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Broker {
    /// broker ID from the topology metadata
    pub id: i32,
    pub host: String,
    pub port: i32,
}

impl Broker {
    /// `host:port`, ready to be resolved.
    pub fn addr(&self) -> String {
        self.to_string()
    }
}

impl Display for Broker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl<'a> From<&'a MetadataResponseBroker> for Broker {
    fn from(b: &'a MetadataResponseBroker) -> Self {
        Self {
            id: b.node_id,
            host: b.host.clone(),
            port: b.port,
        }
    }
}

impl BrokerTopology {
    pub fn new(brokers: &[MetadataResponseBroker]) -> Self {
        let mut brokers: Vec<Broker> = brokers.iter().map(Broker::from).collect();
        brokers.sort();
        Self(brokers)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn brokers(&self) -> &[Broker] {
        &self.0
    }
}

impl Display for BrokerTopology {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, broker) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", broker.id, broker)?;
        }
        f.write_str("]")
    }
}
