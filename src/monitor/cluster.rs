use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::broker_set::BrokerSet;
use super::discovery::{connect_any, Leadership};
use super::error::{Error, Result};
use crate::config::Config;
use crate::connection::topology::BrokerTopology;
use crate::connection::Connection;
use crate::lag::observe_lag;
use crate::observer::Observer;
use crate::offsets::{GroupOffsets, TopicOffsets};

/// Both offset maps of one successful poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub watermarks: TopicOffsets,
    pub groups: GroupOffsets,
}

/// A discovered cluster: the bootstrap connection, one connection per broker and the broker list
/// they were opened for.
///
/// A `Cluster` is good for as long as its polls succeed. Once one fails (drift included) all of
/// its connections are closed and a new one has to be discovered.
#[derive(Debug)]
pub struct Cluster {
    bootstrap: Connection,
    brokers: BrokerSet,
    topology: BrokerTopology,
}

impl Cluster {
    /// Connects to a seed broker, reads the broker list and connects to every broker on it.
    pub async fn discover(config: &Config) -> Result<Self> {
        config.validate()?;

        let bootstrap = connect_any(config).await?;
        match Self::connect_brokers(&bootstrap, config).await {
            Ok((brokers, topology)) => {
                info!(%topology, "Discovered cluster");
                Ok(Self {
                    bootstrap,
                    brokers,
                    topology,
                })
            }
            Err(err) => {
                bootstrap.close().await;
                Err(err)
            }
        }
    }

    async fn connect_brokers(
        bootstrap: &Connection,
        config: &Config,
    ) -> Result<(BrokerSet, BrokerTopology)> {
        let metadata = bootstrap.fetch_metadata().await?;
        let topology = BrokerTopology::new(&metadata.brokers);
        bootstrap.recycle(metadata);

        if topology.is_empty() {
            return Err(Error::InvalidResponse(
                "metadata advertises no brokers".to_string(),
            ));
        }

        let brokers = BrokerSet::connect(&topology, config).await?;
        Ok((brokers, topology))
    }

    pub fn topology(&self) -> &BrokerTopology {
        &self.topology
    }

    /// Runs one cycle: drift check, fan-out, lag, observer flush.
    ///
    /// On error nothing is reported to `observer` and the cluster is closed.
    pub async fn poll(&self, observer: &dyn Observer) -> Result<Snapshot> {
        match self.poll_inner(observer).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                self.close().await;
                Err(err)
            }
        }
    }

    async fn poll_inner(&self, observer: &dyn Observer) -> Result<Snapshot> {
        debug!("Retrieving metadata");
        let metadata = self.bootstrap.fetch_metadata().await?;

        let found = BrokerTopology::new(&metadata.brokers);
        if found != self.topology {
            self.bootstrap.recycle(metadata);
            return Err(Error::TopologyDrift {
                expected: self.topology.clone(),
                found,
            });
        }

        let leadership = Arc::new(Leadership::new(&metadata));
        self.bootstrap.recycle(metadata);

        debug!("Fetching consumer group offsets");
        let groups = self.brokers.fetch_group_offsets(&leadership).await?;

        debug!("Fetching topic offsets");
        let watermarks = self.brokers.fetch_watermarks(&leadership).await?;

        let observed = observe_lag(observer, &watermarks, &groups);
        if let Err(err) = observer.flush() {
            warn!(%err, "Cannot flush observer");
        }
        debug!(observed, "Published observations");

        Ok(Snapshot {
            taken_at: Utc::now(),
            watermarks,
            groups,
        })
    }

    /// Closes every connection. Calling it again does nothing.
    pub async fn close(&self) {
        self.brokers.close().await;
        self.bootstrap.close().await;
    }
}
