use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::ApiVersion;
use crate::protocol::error::Error;
use crate::protocol::messages::RequestBody;
use crate::protocol::traits::{EncodedSize, ReadError, ReadType, WriteError, WriteType};
#[cfg(test)]
use proptest::prelude::*;

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct OffsetFetchRequestTopic {
    /// The topic name.
    pub name: String,

    /// The partition indexes we would like to fetch offsets for.
    #[cfg_attr(test, proptest(strategy = "prop::collection::vec(any::<i32>(), 0..4)"))]
    pub partition_indexes: Vec<i32>,
}

impl EncodedSize for OffsetFetchRequestTopic {
    fn encoded_size(&self) -> usize {
        self.name.encoded_size() + self.partition_indexes.encoded_size()
    }
}

impl<R> ReadType<R> for OffsetFetchRequestTopic
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (name, remain) = String::read(reader, remain)?;
        let (partition_indexes, remain) = Vec::<i32>::read(reader, remain)?;

        Ok((
            Self {
                name,
                partition_indexes,
            },
            remain,
        ))
    }
}

impl<W> WriteType<W> for OffsetFetchRequestTopic
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.name.write(writer)?;
        self.partition_indexes.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct OffsetFetchRequest {
    /// The group to fetch offsets for.
    pub group_id: String,

    /// Each topic we would like to fetch offsets for.
    #[cfg_attr(
        test,
        proptest(strategy = "prop::collection::vec(any::<OffsetFetchRequestTopic>(), 0..4)")
    )]
    pub topics: Vec<OffsetFetchRequestTopic>,
}

impl EncodedSize for OffsetFetchRequest {
    fn encoded_size(&self) -> usize {
        self.group_id.encoded_size() + self.topics.encoded_size()
    }
}

impl<R> ReadType<R> for OffsetFetchRequest
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (group_id, remain) = String::read(reader, remain)?;
        let (topics, remain) = Vec::<OffsetFetchRequestTopic>::read(reader, remain)?;
        Ok((Self { group_id, topics }, remain))
    }
}

impl<W> WriteType<W> for OffsetFetchRequest
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.group_id.write(writer)?;
        self.topics.write(writer)?;
        Ok(())
    }
}

impl RequestBody for OffsetFetchRequest {
    type ResponseBody = OffsetFetchResponse;

    const API_KEY: ApiKey = ApiKey::OffsetFetch;

    const API_VERSION: ApiVersion = ApiVersion::new(3);
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct OffsetFetchResponsePartition {
    /// The partition index.
    pub partition_index: i32,

    /// The committed message offset, `-1` if the group never committed one.
    pub committed_offset: i64,

    /// The partition metadata.
    pub metadata: Option<String>,

    /// The error code, or 0 if there was no error.
    #[cfg_attr(test, proptest(strategy = "crate::protocol::error::arbitrary_error()"))]
    pub error_code: Option<Error>,
}

impl EncodedSize for OffsetFetchResponsePartition {
    fn encoded_size(&self) -> usize {
        4 + 8 + self.metadata.encoded_size() + self.error_code.encoded_size()
    }
}

impl<R> ReadType<R> for OffsetFetchResponsePartition
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (partition_index, remain) = i32::read(reader, remain)?;
        let (committed_offset, remain) = i64::read(reader, remain)?;
        let (metadata, remain) = Option::<String>::read(reader, remain)?;
        let (error_code, remain) = Option::<Error>::read(reader, remain)?;

        Ok((
            Self {
                partition_index,
                committed_offset,
                metadata,
                error_code,
            },
            remain,
        ))
    }
}

impl<W> WriteType<W> for OffsetFetchResponsePartition
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.partition_index.write(writer)?;
        self.committed_offset.write(writer)?;
        self.metadata.write(writer)?;
        self.error_code.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct OffsetFetchResponseTopic {
    /// The topic name.
    pub name: String,

    /// The responses per partition
    #[cfg_attr(
        test,
        proptest(strategy = "prop::collection::vec(any::<OffsetFetchResponsePartition>(), 0..4)")
    )]
    pub partitions: Vec<OffsetFetchResponsePartition>,
}

impl EncodedSize for OffsetFetchResponseTopic {
    fn encoded_size(&self) -> usize {
        self.name.encoded_size() + self.partitions.encoded_size()
    }
}

impl<R> ReadType<R> for OffsetFetchResponseTopic
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (name, remain) = String::read(reader, remain)?;
        let (partitions, remain) = Vec::<OffsetFetchResponsePartition>::read(reader, remain)?;
        Ok((Self { name, partitions }, remain))
    }
}

impl<W> WriteType<W> for OffsetFetchResponseTopic
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.name.write(writer)?;
        self.partitions.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct OffsetFetchResponse {
    /// The duration in milliseconds for which the request was throttled due to
    /// a quota violation, or zero if the request did not violate any quota.
    pub throttle_time_ms: i32,

    /// The responses per topic.
    #[cfg_attr(
        test,
        proptest(strategy = "prop::collection::vec(any::<OffsetFetchResponseTopic>(), 0..4)")
    )]
    pub topics: Vec<OffsetFetchResponseTopic>,

    /// The top-level error code, or 0 if there was no error.
    #[cfg_attr(test, proptest(strategy = "crate::protocol::error::arbitrary_error()"))]
    pub error_code: Option<Error>,
}

impl EncodedSize for OffsetFetchResponse {
    fn encoded_size(&self) -> usize {
        4 + self.topics.encoded_size() + self.error_code.encoded_size()
    }
}

impl<R> ReadType<R> for OffsetFetchResponse
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (throttle_time_ms, remain) = i32::read(reader, remain)?;
        let (topics, remain) = Vec::<OffsetFetchResponseTopic>::read(reader, remain)?;
        let (error_code, remain) = Option::<Error>::read(reader, remain)?;

        Ok((
            Self {
                throttle_time_ms,
                topics,
                error_code,
            },
            remain,
        ))
    }
}

impl<W> WriteType<W> for OffsetFetchResponse
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.throttle_time_ms.write(writer)?;
        self.topics.write(writer)?;
        self.error_code.write(writer)?;
        Ok(())
    }
}
