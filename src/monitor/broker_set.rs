//! One connection per broker and the per-cycle fan-out over all of them.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::task::JoinSet;
use tracing::debug;

use super::discovery::Leadership;
use super::error::{Error, RequestContext, Result};
use crate::config::Config;
use crate::connection::topology::BrokerTopology;
use crate::connection::Connection;
use crate::offsets::{GroupOffsets, TopicOffsets, NO_OFFSET};
use crate::protocol::messages::OffsetFetchResponseTopic;
use crate::throttle::Throttle;

/// A broker of the current generation.
#[derive(Debug)]
pub struct NodeBroker {
    node_id: i32,
    conn: Connection,
    throttle: Throttle,
}

impl NodeBroker {
    /// Latest offsets of the partitions this broker leads.
    async fn fetch_watermarks(&self, leadership: &Leadership) -> Result<TopicOffsets> {
        let mut offsets = TopicOffsets::new();

        let Some(partitions) = leadership.led_by(self.node_id) else {
            debug!(broker = self.node_id, "Broker leads no partition");
            return Ok(offsets);
        };

        self.throttle.wait().await;
        let response = self.conn.fetch_watermark_offsets(partitions).await?;

        for topic in response.topics {
            for partition in topic.partitions {
                if let Some(err) = partition.error_code {
                    debug!(
                        broker = self.node_id,
                        topic = %topic.name,
                        partition = partition.partition_index,
                        %err,
                        "Skipping watermark",
                    );
                    continue;
                }

                offsets.insert(&topic.name, partition.partition_index, partition.offset);
            }
        }

        Ok(offsets)
    }

    /// Committed offsets of every group this broker coordinates.
    async fn fetch_group_offsets(&self, leadership: &Leadership) -> Result<GroupOffsets> {
        self.throttle.wait().await;
        let response = self.conn.list_groups().await?;
        self.throttle.note(response.throttle_time_ms);

        if let Some(protocol_error) = response.error_code {
            return Err(Error::ServerError {
                protocol_error,
                request: RequestContext::ListGroups,
            });
        }

        let mut offsets = GroupOffsets::new();
        for group in response.groups {
            self.throttle.wait().await;
            let response = self
                .conn
                .fetch_group_offsets(&group.group_id, leadership.partitions())
                .await?;
            self.throttle.note(response.throttle_time_ms);

            if let Some(protocol_error) = response.error_code {
                return Err(Error::ServerError {
                    protocol_error,
                    request: RequestContext::Group(group.group_id),
                });
            }

            let mut topics = TopicOffsets::new();
            for topic in remove_empty(response.topics) {
                let partitions: BTreeMap<i32, i64> = topic
                    .partitions
                    .into_iter()
                    .filter(|p| p.error_code.is_none())
                    .map(|p| (p.partition_index, p.committed_offset))
                    .collect();
                topics.insert_topic(topic.name, partitions);
            }

            offsets.insert_group(group.group_id, topics);
        }

        Ok(offsets)
    }
}

/// Drops topics the group never committed to: every partition at [`NO_OFFSET`].
fn remove_empty(topics: Vec<OffsetFetchResponseTopic>) -> Vec<OffsetFetchResponseTopic> {
    topics
        .into_iter()
        .filter(|t| t.partitions.iter().any(|p| p.committed_offset != NO_OFFSET))
        .collect()
}

/// Connections to every broker of one topology snapshot.
#[derive(Debug)]
pub struct BrokerSet {
    brokers: Vec<Arc<NodeBroker>>,
}

impl BrokerSet {
    /// Connects to all brokers in parallel. Fails if any one of them cannot be reached.
    pub async fn connect(topology: &BrokerTopology, config: &Config) -> Result<Self> {
        let connects = topology.brokers().iter().map(|broker| async move {
            let conn = Connection::connect(&broker.addr(), config).await?;
            Ok::<_, Error>(Arc::new(NodeBroker {
                node_id: broker.id,
                conn,
                throttle: Throttle::default(),
            }))
        });

        Ok(Self {
            brokers: try_join_all(connects).await?,
        })
    }

    /// Runs `f` for every broker as its own task and waits for all of them.
    ///
    /// Returns the first error once every task finished; results of the other tasks are dropped.
    async fn scatter<T, F, Fut>(&self, f: F) -> Result<Vec<T>>
    where
        F: Fn(Arc<NodeBroker>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let mut tasks = JoinSet::new();
        for broker in &self.brokers {
            let node_id = broker.node_id;
            let fut = f(Arc::clone(broker));
            tasks.spawn(async move {
                fut.await.map_err(|err| Error::BrokerTask {
                    node_id,
                    source: Box::new(err),
                })
            });
        }

        let mut results = Vec::with_capacity(self.brokers.len());
        let mut first_err = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(result)) => results.push(result),
                Ok(Err(err)) => {
                    first_err.get_or_insert(err);
                }
                Err(err) => {
                    first_err.get_or_insert(Error::TaskJoin(err));
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }

    /// Latest offset of every partition with a leader, cluster wide.
    pub async fn fetch_watermarks(&self, leadership: &Arc<Leadership>) -> Result<TopicOffsets> {
        let partials = self
            .scatter(|broker| {
                let leadership = Arc::clone(leadership);
                async move { broker.fetch_watermarks(&leadership).await }
            })
            .await?;

        let mut all = TopicOffsets::new();
        for partial in partials {
            all.merge(partial);
        }
        Ok(all)
    }

    /// Committed offsets of every group, cluster wide.
    pub async fn fetch_group_offsets(&self, leadership: &Arc<Leadership>) -> Result<GroupOffsets> {
        let partials = self
            .scatter(|broker| {
                let leadership = Arc::clone(leadership);
                async move { broker.fetch_group_offsets(&leadership).await }
            })
            .await?;

        let mut all = GroupOffsets::new();
        for partial in partials {
            all.merge(partial);
        }
        Ok(all)
    }

    pub async fn close(&self) {
        for broker in &self.brokers {
            broker.conn.close().await;
        }
        debug!(brokers = self.brokers.len(), "Closed broker connections");
    }
}
