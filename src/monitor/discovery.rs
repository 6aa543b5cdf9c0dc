//! Finding the cluster: seed brokers, metadata and partition leadership.

use std::collections::BTreeMap;

use tracing::{info, warn};

use super::error::{Error, Result};
use crate::config::Config;
use crate::connection::Connection;
use crate::protocol::messages::MetadataResponse;

/// Kafka's internal topic holding committed offsets; it has no watermarks worth reporting.
pub const CONSUMER_OFFSETS_TOPIC: &str = "__consumer_offsets";

/// Connects to the first seed broker that answers, trying them in order.
pub async fn connect_any(config: &Config) -> Result<Connection> {
    let mut last = None;

    for seed in &config.seed_brokers {
        match Connection::connect(seed, config).await {
            Ok(conn) => {
                info!(broker = %seed, "Connected to seed broker");
                return Ok(conn);
            }
            Err(err) => {
                warn!(broker = %seed, %err, "Cannot connect to seed broker");
                last = Some(err);
            }
        }
    }

    match last {
        Some(last) => Err(Error::NoReachableSeed {
            seeds: config.seed_brokers.clone(),
            last,
        }),
        None => Err(crate::config::ConfigError::NoSeedBrokers.into()),
    }
}

/// Partition layout of one metadata response.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Leadership {
    /// `node -> topic -> partitions led`, without the offsets topic.
    leaders: BTreeMap<i32, BTreeMap<String, Vec<i32>>>,

    /// `topic -> partitions`, every topic.
    partitions: BTreeMap<String, Vec<i32>>,
}

impl Leadership {
    pub fn new(metadata: &MetadataResponse) -> Self {
        let mut leadership = Self::default();

        for topic in &metadata.topics {
            if let Some(err) = topic.error {
                warn!(topic = %topic.name, %err, "Topic metadata carries an error");
            }

            let indexes = topic.partitions.iter().map(|p| p.partition_index).collect();
            leadership.partitions.insert(topic.name.clone(), indexes);

            if topic.name == CONSUMER_OFFSETS_TOPIC {
                continue;
            }

            for partition in &topic.partitions {
                // -1 while a leader election is in progress
                if partition.leader_id < 0 {
                    continue;
                }

                leadership
                    .leaders
                    .entry(partition.leader_id)
                    .or_default()
                    .entry(topic.name.clone())
                    .or_default()
                    .push(partition.partition_index);
            }
        }

        leadership
    }

    /// Partitions `node_id` leads, `None` if it leads nothing.
    pub fn led_by(&self, node_id: i32) -> Option<&BTreeMap<String, Vec<i32>>> {
        self.leaders.get(&node_id)
    }

    /// Every partition of every topic.
    pub fn partitions(&self) -> &BTreeMap<String, Vec<i32>> {
        &self.partitions
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::messages::{MetadataResponsePartition, MetadataResponseTopic};

    use super::*;

    fn topic(name: &str, leaders: &[i32]) -> MetadataResponseTopic {
        MetadataResponseTopic {
            error: None,
            name: name.to_string(),
            partitions: leaders
                .iter()
                .enumerate()
                .map(|(idx, &leader_id)| MetadataResponsePartition {
                    error: None,
                    partition_index: idx as i32,
                    leader_id,
                    replica_nodes: vec![leader_id],
                    isr_nodes: vec![leader_id],
                })
                .collect(),
        }
    }

    #[test]
    fn test_leadership() {
        let metadata = MetadataResponse {
            brokers: vec![],
            topics: vec![
                topic("t", &[1, 2, 1]),
                topic("u", &[2, -1]),
                topic(CONSUMER_OFFSETS_TOPIC, &[3, 3]),
            ],
        };
        let leadership = Leadership::new(&metadata);

        assert_eq!(
            leadership.led_by(1),
            Some(&BTreeMap::from([("t".to_string(), vec![0, 2])]))
        );
        assert_eq!(
            leadership.led_by(2),
            Some(&BTreeMap::from([
                ("t".to_string(), vec![1]),
                ("u".to_string(), vec![0]),
            ]))
        );
        assert_eq!(leadership.led_by(3), None);

        assert_eq!(leadership.partitions().len(), 3);
        assert_eq!(leadership.partitions()["u"], vec![0, 1]);
        assert_eq!(leadership.partitions()[CONSUMER_OFFSETS_TOPIC], vec![0, 1]);
    }
}
