//! `ListOffsets` request and response, version 1.
//!
//! # References
//! - [KIP-79](https://cwiki.apache.org/confluence/pages/viewpage.action?pageId=65868090)
use std::io::{Read, Write};

use crate::protocol::{
    api_key::ApiKey,
    api_version::ApiVersion,
    error::Error as ApiError,
    traits::{EncodedSize, ReadError, ReadType, WriteError, WriteType},
};
#[cfg(test)]
use proptest::prelude::*;

use super::RequestBody;

/// Timestamp asking for the offset of the next message to be written.
pub const LATEST_OFFSET: i64 = -1;

/// Timestamp asking for the oldest retained offset.
pub const EARLIEST_OFFSET: i64 = -2;

/// `replica_id` of an ordinary client.
pub const CONSUMER_REPLICA_ID: i32 = -1;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ListOffsetsRequestPartition {
    /// The partition index.
    pub partition_index: i32,

    /// The current timestamp.
    ///
    /// The broker returns the offset of the first message whose timestamp is greater or equal
    /// than this. Per [KIP-79] this can have the following special values:
    ///
    /// - `-1`: latest offset
    /// - `-2`: earlist offset
    ///
    /// [KIP-79]: https://cwiki.apache.org/confluence/pages/viewpage.action?pageId=65868090
    pub timestamp: i64,
}

impl EncodedSize for ListOffsetsRequestPartition {
    fn encoded_size(&self) -> usize {
        4 + 8
    }
}

impl<R> ReadType<R> for ListOffsetsRequestPartition
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (partition_index, remain) = i32::read(reader, remain)?;
        let (timestamp, remain) = i64::read(reader, remain)?;

        Ok((
            Self {
                partition_index,
                timestamp,
            },
            remain,
        ))
    }
}

impl<W> WriteType<W> for ListOffsetsRequestPartition
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.partition_index.write(writer)?;
        self.timestamp.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ListOffsetsRequestTopic {
    /// The topic name.
    pub name: String,

    /// Each partition in the request.
    ///
    /// Note: A partition may only appear once within the request.
    #[cfg_attr(
        test,
        proptest(strategy = "prop::collection::vec(any::<ListOffsetsRequestPartition>(), 0..4)")
    )]
    pub partitions: Vec<ListOffsetsRequestPartition>,
}

impl EncodedSize for ListOffsetsRequestTopic {
    fn encoded_size(&self) -> usize {
        self.name.encoded_size() + self.partitions.encoded_size()
    }
}

impl<R> ReadType<R> for ListOffsetsRequestTopic
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (name, remain) = String::read(reader, remain)?;
        let (partitions, remain) = Vec::<ListOffsetsRequestPartition>::read(reader, remain)?;
        Ok((Self { name, partitions }, remain))
    }
}

impl<W> WriteType<W> for ListOffsetsRequestTopic
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
pub struct ListOffsetsRequest {
    /// The broker ID of the requestor, or -1 if this request is being made by a normal consumer.
    pub replica_id: i32,

    /// Each topic in the request.
    ///
    /// Note: A topic may only appear once within the request.
    #[cfg_attr(
        test,
        proptest(strategy = "prop::collection::vec(any::<ListOffsetsRequestTopic>(), 0..4)")
    )]
    pub topics: Vec<ListOffsetsRequestTopic>,
}

impl EncodedSize for ListOffsetsRequest {
    fn encoded_size(&self) -> usize {
        4 + self.topics.encoded_size()
    }
}

impl<R> ReadType<R> for ListOffsetsRequest
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (replica_id, remain) = i32::read(reader, remain)?;
        let (topics, remain) = Vec::<ListOffsetsRequestTopic>::read(reader, remain)?;
        Ok((Self { replica_id, topics }, remain))
    }
}

impl<W> WriteType<W> for ListOffsetsRequest
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.replica_id.write(writer)?;
        self.topics.write(writer)?;
        Ok(())
    }
}

impl RequestBody for ListOffsetsRequest {
    type ResponseBody = ListOffsetsResponse;

    const API_KEY: ApiKey = ApiKey::ListOffsets;

    const API_VERSION: ApiVersion = ApiVersion::new(1);
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ListOffsetsResponsePartition {
    /// The partition index.
    pub partition_index: i32,

    /// The partition error code, or 0 if there was no error.
    #[cfg_attr(test, proptest(strategy = "crate::protocol::error::arbitrary_error()"))]
    pub error_code: Option<ApiError>,

    /// The timestamp associated with the returned offset.
    pub timestamp: i64,

    /// The returned offset.
    pub offset: i64,
}

impl EncodedSize for ListOffsetsResponsePartition {
    fn encoded_size(&self) -> usize {
        4 + self.error_code.encoded_size() + 8 + 8
    }
}

impl<R> ReadType<R> for ListOffsetsResponsePartition
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (partition_index, remain) = i32::read(reader, remain)?;
        let (error_code, remain) = Option::<ApiError>::read(reader, remain)?;
        let (timestamp, remain) = i64::read(reader, remain)?;
        let (offset, remain) = i64::read(reader, remain)?;

        Ok((
            Self {
                partition_index,
                error_code,
                timestamp,
                offset,
            },
            remain,
        ))
    }
}

impl<W> WriteType<W> for ListOffsetsResponsePartition
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.partition_index.write(writer)?;
        self.error_code.write(writer)?;
        self.timestamp.write(writer)?;
        self.offset.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ListOffsetsResponseTopic {
    /// The topic name.
    pub name: String,

    /// Each partition in the response.
    #[cfg_attr(
        test,
        proptest(strategy = "prop::collection::vec(any::<ListOffsetsResponsePartition>(), 0..4)")
    )]
    pub partitions: Vec<ListOffsetsResponsePartition>,
}

impl EncodedSize for ListOffsetsResponseTopic {
    fn encoded_size(&self) -> usize {
        self.name.encoded_size() + self.partitions.encoded_size()
    }
}

impl<R> ReadType<R> for ListOffsetsResponseTopic
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (name, remain) = String::read(reader, remain)?;
        let (partitions, remain) = Vec::<ListOffsetsResponsePartition>::read(reader, remain)?;
        Ok((Self { name, partitions }, remain))
    }
}

impl<W> WriteType<W> for ListOffsetsResponseTopic
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
pub struct ListOffsetsResponse {
    /// Each topic in the response.
    #[cfg_attr(
        test,
        proptest(strategy = "prop::collection::vec(any::<ListOffsetsResponseTopic>(), 0..4)")
    )]
    pub topics: Vec<ListOffsetsResponseTopic>,
}

impl EncodedSize for ListOffsetsResponse {
    fn encoded_size(&self) -> usize {
        self.topics.encoded_size()
    }
}

impl<R> ReadType<R> for ListOffsetsResponse
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (topics, remain) = Vec::<ListOffsetsResponseTopic>::read(reader, remain)?;
        Ok((Self { topics }, remain))
    }
}

impl<W> WriteType<W> for ListOffsetsResponse
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.topics.write(writer)
    }
}
