//! `Metadata` request and response, version 0.
//!
//! The response is fetched on every poll cycle and can hold thousands of partition records, so it
//! is decoded into pooled values (see [`MetadataPool`]).

use std::io::{Read, Write};

use super::RequestBody;
use crate::protocol::{
    api_key::ApiKey,
    api_version::ApiVersion,
    error::Error,
    pool::{Pool, Recycle},
    primitives::read_array_len,
    traits::{EncodedSize, ReadError, ReadType, WriteError, WriteType},
};
#[cfg(test)]
use proptest::prelude::*;

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct MetadataRequest {
    /// The topics to fetch metadata for.
    ///
    /// Requests data for all topics if empty.
    #[cfg_attr(test, proptest(strategy = "prop::collection::vec(any::<String>(), 0..4)"))]
    pub topics: Vec<String>,
}

impl RequestBody for MetadataRequest {
    type ResponseBody = MetadataResponse;

    const API_KEY: ApiKey = ApiKey::Metadata;

    const API_VERSION: ApiVersion = ApiVersion::new(0);
}

impl EncodedSize for MetadataRequest {
    fn encoded_size(&self) -> usize {
        self.topics.encoded_size()
    }
}

impl<R> ReadType<R> for MetadataRequest
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (topics, remain) = Vec::<String>::read(reader, remain)?;
        Ok((Self { topics }, remain))
    }
}

impl<W> WriteType<W> for MetadataRequest
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.topics.write(writer)
    }
}

/// Free-lists for metadata responses and their per-topic records.
#[derive(Debug)]
pub struct MetadataPool {
    responses: Pool<MetadataResponse>,
    topics: Pool<MetadataResponseTopic>,
}

impl MetadataPool {
    /// `topics` bounds how many idle topic records are kept around.
    pub fn new(topics: usize) -> Self {
        Self {
            responses: Pool::new(2),
            topics: Pool::new(topics),
        }
    }

    /// Idle topic records.
    pub fn idle_topics(&self) -> usize {
        self.topics.idle()
    }
}

impl Default for MetadataPool {
    fn default() -> Self {
        Self::new(4096)
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct MetadataResponse {
    /// Each broker in the response
    #[cfg_attr(
        test,
        proptest(strategy = "prop::collection::vec(any::<MetadataResponseBroker>(), 0..4)")
    )]
    pub brokers: Vec<MetadataResponseBroker>,

    /// Each topic in the response
    #[cfg_attr(
        test,
        proptest(strategy = "prop::collection::vec(any::<MetadataResponseTopic>(), 0..4)")
    )]
    pub topics: Vec<MetadataResponseTopic>,
}

impl MetadataResponse {
    /// Decodes a response, taking the response and its topic records from `pool`.
    pub fn read_pooled<R: Read>(
        reader: &mut R,
        remain: usize,
        pool: &MetadataPool,
    ) -> Result<(Self, usize), ReadError> {
        let mut response = pool.responses.get();

        let (brokers, remain) = Vec::<MetadataResponseBroker>::read(reader, remain)?;
        response.brokers = brokers;

        let (len, mut remain) = read_array_len(reader, remain)?;
        response.topics.reserve(len.min(remain));
        for _ in 0..len {
            let mut topic = pool.topics.get();
            remain = topic.read_into(reader, remain)?;
            response.topics.push(topic);
        }

        Ok((response, remain))
    }

    /// Hands this response and all of its topic records back to `pool`.
    ///
    /// Consumes the response, so nothing can still be looking at the recycled records.
    pub fn free(mut self, pool: &MetadataPool) {
        for topic in self.topics.drain(..) {
            pool.topics.put(topic);
        }
        pool.responses.put(self);
    }
}

impl Recycle for MetadataResponse {
    fn reset(&mut self) {
        self.brokers.clear();
        self.topics.clear();
    }
}

impl EncodedSize for MetadataResponse {
    fn encoded_size(&self) -> usize {
        self.brokers.encoded_size() + self.topics.encoded_size()
    }
}

impl<R> ReadType<R> for MetadataResponse
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        Self::read_pooled(reader, remain, &MetadataPool::new(0))
    }
}

impl<W> WriteType<W> for MetadataResponse
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.brokers.write(writer)?;
        self.topics.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct MetadataResponseBroker {
    /// The broker ID
    pub node_id: i32,

    /// The broker hostname
    pub host: String,

    /// The broker port
    pub port: i32,
}

impl EncodedSize for MetadataResponseBroker {
    fn encoded_size(&self) -> usize {
        4 + self.host.encoded_size() + 4
    }
}

impl<R> ReadType<R> for MetadataResponseBroker
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (node_id, remain) = i32::read(reader, remain)?;
        let (host, remain) = String::read(reader, remain)?;
        let (port, remain) = i32::read(reader, remain)?;

        Ok((
            Self {
                node_id,
                host,
                port,
            },
            remain,
        ))
    }
}

impl<W> WriteType<W> for MetadataResponseBroker
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.node_id.write(writer)?;
        self.host.write(writer)?;
        self.port.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct MetadataResponseTopic {
    /// The topic error if any
    #[cfg_attr(test, proptest(strategy = "crate::protocol::error::arbitrary_error()"))]
    pub error: Option<Error>,

    /// The topic name
    pub name: String,

    /// Each partition in the topic
    #[cfg_attr(
        test,
        proptest(strategy = "prop::collection::vec(any::<MetadataResponsePartition>(), 0..4)")
    )]
    pub partitions: Vec<MetadataResponsePartition>,
}

impl MetadataResponseTopic {
    /// Decodes into `self`, reusing the partition list's allocation.
    fn read_into<R: Read>(&mut self, reader: &mut R, remain: usize) -> Result<usize, ReadError> {
        let (error, remain) = Option::<Error>::read(reader, remain)?;
        let (name, remain) = String::read(reader, remain)?;
        self.error = error;
        self.name = name;

        let (len, mut remain) = read_array_len(reader, remain)?;
        self.partitions.clear();
        self.partitions.reserve(len.min(remain));
        for _ in 0..len {
            let (partition, rest) = MetadataResponsePartition::read(reader, remain)?;
            remain = rest;
            self.partitions.push(partition);
        }

        Ok(remain)
    }
}

impl Recycle for MetadataResponseTopic {
    fn reset(&mut self) {
        self.error = None;
        self.name.clear();
        self.partitions.clear();
    }
}

impl EncodedSize for MetadataResponseTopic {
    fn encoded_size(&self) -> usize {
        self.error.encoded_size() + self.name.encoded_size() + self.partitions.encoded_size()
    }
}

impl<R> ReadType<R> for MetadataResponseTopic
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let mut topic = Self::default();
        let remain = topic.read_into(reader, remain)?;
        Ok((topic, remain))
    }
}

impl<W> WriteType<W> for MetadataResponseTopic
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.error.write(writer)?;
        self.name.write(writer)?;
        self.partitions.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct MetadataResponsePartition {
    /// The partition error if any
    #[cfg_attr(test, proptest(strategy = "crate::protocol::error::arbitrary_error()"))]
    pub error: Option<Error>,

    /// The partition index
    pub partition_index: i32,

    /// The ID of the leader broker
    pub leader_id: i32,

    /// The set of all nodes that host this partition
    #[cfg_attr(test, proptest(strategy = "prop::collection::vec(any::<i32>(), 0..4)"))]
    pub replica_nodes: Vec<i32>,

    /// The set of all nodes that are in sync with the leader for this partition
    #[cfg_attr(test, proptest(strategy = "prop::collection::vec(any::<i32>(), 0..4)"))]
    pub isr_nodes: Vec<i32>,
}

impl EncodedSize for MetadataResponsePartition {
    fn encoded_size(&self) -> usize {
        self.error.encoded_size()
            + 4
            + 4
            + self.replica_nodes.encoded_size()
            + self.isr_nodes.encoded_size()
    }
}

impl<R> ReadType<R> for MetadataResponsePartition
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (error, remain) = Option::<Error>::read(reader, remain)?;
        let (partition_index, remain) = i32::read(reader, remain)?;
        let (leader_id, remain) = i32::read(reader, remain)?;
        let (replica_nodes, remain) = Vec::<i32>::read(reader, remain)?;
        let (isr_nodes, remain) = Vec::<i32>::read(reader, remain)?;

        Ok((
            Self {
                error,
                partition_index,
                leader_id,
                replica_nodes,
                isr_nodes,
            },
            remain,
        ))
    }
}

impl<W> WriteType<W> for MetadataResponsePartition
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.error.write(writer)?;
        self.partition_index.write(writer)?;
        self.leader_id.write(writer)?;
        self.replica_nodes.write(writer)?;
        self.isr_nodes.write(writer)?;
        Ok(())
    }
}
