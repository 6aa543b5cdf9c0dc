//! A single link to a single broker.
//!
//! Requests on one connection are strictly sequential: the transport sits behind an async mutex
//! which is held for the whole round trip.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::protocol::{
    api_key::ApiKey,
    api_version::ApiVersion,
    frame::{encode_frame, AsyncMessageRead, AsyncMessageWrite},
    messages::{
        ListGroupsRequest, ListGroupsResponse, ListOffsetsRequest, ListOffsetsRequestPartition,
        ListOffsetsRequestTopic, ListOffsetsResponse, MetadataPool, MetadataRequest,
        MetadataResponse, OffsetFetchRequest, OffsetFetchRequestTopic, OffsetFetchResponse,
        RequestBody, RequestHeader, ResponseHeader, CONSUMER_REPLICA_ID, LATEST_OFFSET,
    },
    traits::{ReadError, ReadType},
};

pub mod topology;
pub mod transport;

use transport::Transport;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RequestError {
    #[error("Cannot write data: {0}")]
    WriteError(#[from] crate::protocol::traits::WriteError),

    #[error("Cannot write framed message: {0}")]
    WriteMessageError(#[from] crate::protocol::frame::WriteError),

    #[error("Cannot read data: {0}")]
    ReadError(#[from] ReadError),

    #[error("Cannot read framed message: {0}")]
    ReadFramedMessageError(#[from] crate::protocol::frame::ReadError),

    #[error(
        "Data left at the end of the message. Got {message_size} bytes but only read {read} bytes. api_key={api_key:?} api_version={api_version}"
    )]
    TooMuchData {
        message_size: usize,
        read: usize,
        api_key: ApiKey,
        api_version: ApiVersion,
    },

    #[error("Response correlation id {actual} does not match request {expected}")]
    CorrelationMismatch { expected: i32, actual: i32 },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection closed")]
    ConnectionClosed,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Cannot connect to broker {broker}: {error}")]
    Transport {
        broker: String,
        error: transport::Error,
    },

    #[error("Request to broker {broker} failed: {error}")]
    Request { broker: String, error: RequestError },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One open connection to one broker.
#[derive(Debug)]
pub struct Connection {
    addr: String,
    client_id: Arc<str>,
    transport: Mutex<Option<Transport>>,
    correlation_id: AtomicI32,
    max_message_size: usize,
    request_timeout: Duration,
    pool: MetadataPool,
}

impl Connection {
    /// Opens a connection to `addr` (`host:port`).
    pub async fn connect(addr: &str, config: &Config) -> Result<Self> {
        let transport = Transport::connect(
            addr,
            config.tls_config.clone(),
            config.resolver.as_deref(),
            config.connect_timeout,
        )
        .await
        .map_err(|error| Error::Transport {
            broker: addr.to_string(),
            error,
        })?;

        info!(broker = addr, "Established new connection");

        Ok(Self {
            addr: addr.to_string(),
            client_id: Arc::clone(&config.client_id),
            transport: Mutex::new(Some(transport)),
            correlation_id: AtomicI32::new(0),
            max_message_size: config.max_message_size,
            request_timeout: config.request_timeout,
            pool: MetadataPool::default(),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Fetches metadata for all topics.
    ///
    /// Hand the response back with [`recycle`](Self::recycle) once done with it.
    pub async fn fetch_metadata(&self) -> Result<MetadataResponse> {
        let pool = &self.pool;
        self.round_trip(&MetadataRequest::default(), |reader, remain| {
            MetadataResponse::read_pooled(reader, remain, pool)
        })
        .await
    }

    /// Returns a metadata response's allocations to this connection's pool.
    pub fn recycle(&self, response: MetadataResponse) {
        response.free(&self.pool);
    }

    /// Asks for the latest offset of every listed partition.
    pub async fn fetch_watermark_offsets(
        &self,
        partitions: &BTreeMap<String, Vec<i32>>,
    ) -> Result<ListOffsetsResponse> {
        let request = ListOffsetsRequest {
            replica_id: CONSUMER_REPLICA_ID,
            topics: partitions
                .iter()
                .map(|(name, partitions)| ListOffsetsRequestTopic {
                    name: name.clone(),
                    partitions: partitions
                        .iter()
                        .map(|&partition_index| ListOffsetsRequestPartition {
                            partition_index,
                            timestamp: LATEST_OFFSET,
                        })
                        .collect(),
                })
                .collect(),
        };

        self.request(&request).await
    }

    /// Lists the groups this broker coordinates.
    pub async fn list_groups(&self) -> Result<ListGroupsResponse> {
        self.request(&ListGroupsRequest).await
    }

    /// Fetches the committed offsets of `group` for every listed partition.
    pub async fn fetch_group_offsets(
        &self,
        group: &str,
        partitions: &BTreeMap<String, Vec<i32>>,
    ) -> Result<OffsetFetchResponse> {
        let request = OffsetFetchRequest {
            group_id: group.to_string(),
            topics: partitions
                .iter()
                .map(|(name, partitions)| OffsetFetchRequestTopic {
                    name: name.clone(),
                    partition_indexes: partitions.clone(),
                })
                .collect(),
        };

        self.request(&request).await
    }

    /// Closes the connection. Calling it again does nothing.
    pub async fn close(&self) {
        if let Some(mut transport) = self.transport.lock().await.take() {
            use tokio::io::AsyncWriteExt;

            if let Err(err) = transport.shutdown().await {
                debug!(broker = %self.addr, %err, "Error shutting down connection");
            }
            info!(broker = %self.addr, "Closed connection");
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.transport.lock().await.is_none()
    }

    async fn request<R>(&self, body: &R) -> Result<R::ResponseBody>
    where
        R: RequestBody + Send + Sync,
    {
        self.round_trip(body, <R::ResponseBody as ReadType<Cursor<Vec<u8>>>>::read)
            .await
    }

    /// Sends `body`, waits for the matching response and decodes it with `decode`.
    ///
    /// Any failure leaves the connection closed.
    async fn round_trip<R, T, F>(&self, body: &R, decode: F) -> Result<T>
    where
        R: RequestBody + Send + Sync,
        F: FnOnce(&mut Cursor<Vec<u8>>, usize) -> Result<(T, usize), ReadError>,
    {
        let mut transport = self.transport.lock().await;

        let res = match transport.as_mut() {
            Some(t) => self.exchange(t, body, decode).await,
            None => Err(RequestError::ConnectionClosed),
        };

        res.map_err(|error| {
            if transport.take().is_some() {
                warn!(broker = %self.addr, %error, "Request failed, closing connection");
            }

            Error::Request {
                broker: self.addr.clone(),
                error,
            }
        })
    }

    async fn exchange<R, T, F>(
        &self,
        transport: &mut Transport,
        body: &R,
        decode: F,
    ) -> Result<T, RequestError>
    where
        R: RequestBody + Send + Sync,
        F: FnOnce(&mut Cursor<Vec<u8>>, usize) -> Result<(T, usize), ReadError>,
    {
        let correlation_id = self.correlation_id.fetch_add(1, Ordering::SeqCst);
        let header = RequestHeader {
            request_api_key: R::API_KEY,
            request_api_version: R::API_VERSION,
            correlation_id,
            client_id: Some(self.client_id.to_string()),
        };
        let frame = encode_frame(&header, body)?;

        let msg = tokio::time::timeout(self.request_timeout, async {
            transport.write_message(&frame).await?;
            Ok::<_, RequestError>(transport.read_message(self.max_message_size).await?)
        })
        .await
        .map_err(|_| RequestError::Timeout(self.request_timeout))??;

        let message_size = msg.len();
        let mut cursor = Cursor::new(msg);

        let (response_header, remain) = ResponseHeader::read(&mut cursor, message_size)?;
        if response_header.correlation_id != correlation_id {
            return Err(RequestError::CorrelationMismatch {
                expected: correlation_id,
                actual: response_header.correlation_id,
            });
        }

        let (body, remain) = decode(&mut cursor, remain)?;
        if remain != 0 {
            return Err(RequestError::TooMuchData {
                message_size,
                read: message_size - remain,
                api_key: R::API_KEY,
                api_version: R::API_VERSION,
            });
        }

        Ok(body)
    }
}
