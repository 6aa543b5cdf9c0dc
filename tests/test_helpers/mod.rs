#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use kafka_lag::observer::{Observer, ObserverError};
use kafka_lag::protocol::api_key::ApiKey;
use kafka_lag::protocol::error::Error as ApiError;
use kafka_lag::protocol::frame::{encode_frame, AsyncMessageRead, AsyncMessageWrite};
use kafka_lag::protocol::messages::{
    Group, ListGroupsRequest, ListGroupsResponse, ListOffsetsRequest, ListOffsetsResponse,
    ListOffsetsResponsePartition, ListOffsetsResponseTopic, MetadataRequest, MetadataResponse,
    MetadataResponseBroker, MetadataResponsePartition, MetadataResponseTopic, OffsetFetchRequest,
    OffsetFetchResponse, OffsetFetchResponsePartition, OffsetFetchResponseTopic, RequestHeader,
    ResponseHeader,
};
use kafka_lag::protocol::traits::{ReadType, WriteType};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

static LOG_SETUP: Once = Once::new();

/// Enables debug logging if the `RUST_LOG` environment variable is set. Does nothing if
/// `RUST_LOG` is not set.
pub fn maybe_start_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        start_logging()
    }
}

/// Start logging, filtered by `RUST_LOG`.
pub fn start_logging() {
    LOG_SETUP.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// What the fake brokers know and answer with.
#[derive(Debug, Default)]
pub struct ClusterState {
    /// Brokers advertised in metadata.
    pub brokers: Vec<MetadataResponseBroker>,

    /// `topic -> leader of each partition`
    pub topics: BTreeMap<String, Vec<i32>>,

    pub watermarks: BTreeMap<(String, i32), i64>,

    /// `group -> coordinator`
    pub coordinators: BTreeMap<String, i32>,

    /// `(group, topic, partition) -> committed offset`
    pub committed: BTreeMap<(String, String, i32), i64>,

    /// Nodes answering ListGroups with an error.
    pub broken: BTreeSet<i32>,

    /// Every `(node, topic, partition)` a watermark was asked for.
    pub watermark_requests: Vec<(i32, String, i32)>,
}

impl ClusterState {
    fn metadata(&self) -> MetadataResponse {
        MetadataResponse {
            brokers: self.brokers.clone(),
            topics: self
                .topics
                .iter()
                .map(|(name, leaders)| MetadataResponseTopic {
                    error: None,
                    name: name.clone(),
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
                })
                .collect(),
        }
    }

    fn leader(&self, topic: &str, partition: i32) -> Option<i32> {
        let idx = usize::try_from(partition).ok()?;
        self.topics.get(topic)?.get(idx).copied()
    }

    fn list_offsets(&mut self, node_id: i32, request: ListOffsetsRequest) -> ListOffsetsResponse {
        let mut topics = vec![];
        for topic in request.topics {
            let mut partitions = vec![];
            for p in topic.partitions {
                self.watermark_requests
                    .push((node_id, topic.name.clone(), p.partition_index));

                let offset = self.watermarks.get(&(topic.name.clone(), p.partition_index));
                let partition = match (self.leader(&topic.name, p.partition_index), offset) {
                    (Some(leader), Some(&offset)) if leader == node_id => {
                        ListOffsetsResponsePartition {
                            partition_index: p.partition_index,
                            error_code: None,
                            timestamp: -1,
                            offset,
                        }
                    }
                    _ => ListOffsetsResponsePartition {
                        partition_index: p.partition_index,
                        error_code: Some(ApiError::NotLeaderOrFollower),
                        timestamp: -1,
                        offset: -1,
                    },
                };
                partitions.push(partition);
            }

            topics.push(ListOffsetsResponseTopic {
                name: topic.name,
                partitions,
            });
        }

        ListOffsetsResponse { topics }
    }

    fn list_groups(&self, node_id: i32) -> ListGroupsResponse {
        if self.broken.contains(&node_id) {
            return ListGroupsResponse {
                throttle_time_ms: 0,
                error_code: Some(ApiError::CoordinatorNotAvailable),
                groups: vec![],
            };
        }

        ListGroupsResponse {
            throttle_time_ms: 0,
            error_code: None,
            groups: self
                .coordinators
                .iter()
                .filter(|(_, &coordinator)| coordinator == node_id)
                .map(|(group, _)| Group {
                    group_id: group.clone(),
                    protocol_type: "consumer".to_string(),
                })
                .collect(),
        }
    }

    fn offset_fetch(&self, node_id: i32, request: OffsetFetchRequest) -> OffsetFetchResponse {
        if self.coordinators.get(&request.group_id) != Some(&node_id) {
            return OffsetFetchResponse {
                throttle_time_ms: 0,
                topics: vec![],
                error_code: Some(ApiError::NotCoordinator),
            };
        }

        OffsetFetchResponse {
            throttle_time_ms: 0,
            topics: request
                .topics
                .iter()
                .map(|t| OffsetFetchResponseTopic {
                    name: t.name.clone(),
                    partitions: t
                        .partition_indexes
                        .iter()
                        .map(|&partition_index| OffsetFetchResponsePartition {
                            partition_index,
                            committed_offset: self
                                .committed
                                .get(&(request.group_id.clone(), t.name.clone(), partition_index))
                                .copied()
                                .unwrap_or(-1),
                            metadata: None,
                            error_code: None,
                        })
                        .collect(),
                })
                .collect(),
            error_code: None,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicUsize,
    closed: AtomicUsize,
}

/// A handful of in-process brokers answering from one shared [`ClusterState`].
#[derive(Debug)]
pub struct FakeCluster {
    state: Arc<Mutex<ClusterState>>,
    addrs: BTreeMap<i32, String>,
    counters: Arc<Counters>,
    tasks: Vec<JoinHandle<()>>,
}

impl FakeCluster {
    /// Starts brokers `1..=n`, all of them advertised.
    pub async fn start(n: i32) -> Self {
        let state = Arc::new(Mutex::new(ClusterState::default()));
        let counters = Arc::new(Counters::default());

        let mut addrs = BTreeMap::new();
        let mut tasks = vec![];
        for node_id in 1..=n {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();

            state.lock().brokers.push(MetadataResponseBroker {
                node_id,
                host: addr.ip().to_string(),
                port: i32::from(addr.port()),
            });
            addrs.insert(node_id, addr.to_string());

            tasks.push(tokio::spawn(serve(
                node_id,
                listener,
                Arc::clone(&state),
                Arc::clone(&counters),
            )));
        }

        Self {
            state,
            addrs,
            counters,
            tasks,
        }
    }

    pub fn addr(&self, node_id: i32) -> String {
        self.addrs[&node_id].clone()
    }

    pub fn seeds(&self) -> Vec<String> {
        vec![self.addr(1)]
    }

    pub fn state(&self) -> parking_lot::MutexGuard<'_, ClusterState> {
        self.state.lock()
    }

    /// Adds the next partition of `topic`.
    pub fn add_partition(&self, topic: &str, leader: i32, watermark: i64) {
        let mut state = self.state.lock();
        let leaders = state.topics.entry(topic.to_string()).or_default();
        let partition = leaders.len() as i32;
        leaders.push(leader);
        state
            .watermarks
            .insert((topic.to_string(), partition), watermark);
    }

    pub fn commit(&self, group: &str, coordinator: i32, topic: &str, partition: i32, offset: i64) {
        let mut state = self.state.lock();
        state.coordinators.insert(group.to_string(), coordinator);
        state
            .committed
            .insert((group.to_string(), topic.to_string(), partition), offset);
    }

    /// Stops advertising every broker not in `node_ids`.
    pub fn advertise_only(&self, node_ids: &[i32]) {
        self.state
            .lock()
            .brokers
            .retain(|b| node_ids.contains(&b.node_id));
    }

    pub fn accepted(&self) -> usize {
        self.counters.accepted.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Waits until every accepted connection was closed by the client.
    pub async fn wait_all_closed(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.closed() < self.accepted() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "{} of {} connections still open",
                self.accepted() - self.closed(),
                self.accepted()
            )
        });
    }
}

impl Drop for FakeCluster {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn serve(
    node_id: i32,
    listener: TcpListener,
    state: Arc<Mutex<ClusterState>>,
    counters: Arc<Counters>,
) {
    while let Ok((stream, _)) = listener.accept().await {
        counters.accepted.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(handle(
            node_id,
            stream,
            Arc::clone(&state),
            Arc::clone(&counters),
        ));
    }
}

async fn handle(
    node_id: i32,
    mut stream: TcpStream,
    state: Arc<Mutex<ClusterState>>,
    counters: Arc<Counters>,
) {
    while let Ok(msg) = stream.read_message(1024 * 1024).await {
        let response = respond(node_id, msg, &state);
        if stream.write_message(&response).await.is_err() {
            break;
        }
    }
    counters.closed.fetch_add(1, Ordering::SeqCst);
}

fn respond(node_id: i32, msg: Vec<u8>, state: &Mutex<ClusterState>) -> Vec<u8> {
    let len = msg.len();
    let mut reader = Cursor::new(msg);
    let (header, remain) = RequestHeader::read(&mut reader, len).unwrap();
    let response_header = ResponseHeader {
        correlation_id: header.correlation_id,
    };

    let mut state = state.lock();
    match header.request_api_key {
        ApiKey::Metadata => {
            MetadataRequest::read(&mut reader, remain).unwrap();
            frame(&response_header, &state.metadata())
        }
        ApiKey::ListOffsets => {
            let (request, _) = ListOffsetsRequest::read(&mut reader, remain).unwrap();
            frame(&response_header, &state.list_offsets(node_id, request))
        }
        ApiKey::ListGroups => {
            ListGroupsRequest::read(&mut reader, remain).unwrap();
            frame(&response_header, &state.list_groups(node_id))
        }
        ApiKey::OffsetFetch => {
            let (request, _) = OffsetFetchRequest::read(&mut reader, remain).unwrap();
            frame(&response_header, &state.offset_fetch(node_id, request))
        }
        other => panic!("unexpected request {other:?}"),
    }
}

fn frame<B: WriteType<Vec<u8>>>(header: &ResponseHeader, body: &B) -> Vec<u8> {
    encode_frame(header, body).unwrap()
}

/// Records everything it observes.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Mutex<Vec<(String, String, i32, i64)>>,
    flushes: AtomicUsize,
    closed: AtomicBool,
}

impl Recorder {
    /// Calls so far, sorted, and forgets them.
    pub fn take(&self) -> Vec<(String, String, i32, i64)> {
        let mut calls = std::mem::take(&mut *self.calls.lock());
        calls.sort();
        calls
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Observer for Recorder {
    fn observe(&self, group: &str, topic: &str, partition: i32, lag: i64) {
        self.calls
            .lock()
            .push((group.to_string(), topic.to_string(), partition, lag));
    }

    fn flush(&self) -> Result<(), ObserverError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<(), ObserverError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn call(group: &str, topic: &str, partition: i32, lag: i64) -> (String, String, i32, i64) {
    (group.to_string(), topic.to_string(), partition, lag)
}
