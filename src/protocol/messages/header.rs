use std::io::{Read, Write};

use crate::protocol::{
    api_key::ApiKey,
    api_version::ApiVersion,
    traits::{EncodedSize, ReadError, ReadType, WriteError, WriteType},
};
#[cfg(test)]
use proptest::prelude::*;

/// Request header, version 1.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct RequestHeader {
    /// The API key of this request.
    #[cfg_attr(test, proptest(strategy = "any::<i16>().prop_map(ApiKey::from)"))]
    pub request_api_key: ApiKey,

    /// The API version of this request.
    pub request_api_version: ApiVersion,

    /// The correlation ID of this request.
    pub correlation_id: i32,

    /// The client ID string.
    pub client_id: Option<String>,
}

impl EncodedSize for RequestHeader {
    fn encoded_size(&self) -> usize {
        2 + 2 + 4 + self.client_id.encoded_size()
    }
}

impl<R> ReadType<R> for RequestHeader
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (api_key, remain) = i16::read(reader, remain)?;
        let (api_version, remain) = i16::read(reader, remain)?;
        let (correlation_id, remain) = i32::read(reader, remain)?;
        let (client_id, remain) = Option::<String>::read(reader, remain)?;

        Ok((
            Self {
                request_api_key: ApiKey::from(api_key),
                request_api_version: ApiVersion::new(api_version),
                correlation_id,
                client_id,
            },
            remain,
        ))
    }
}

impl<W> WriteType<W> for RequestHeader
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        i16::from(self.request_api_key).write(writer)?;
        self.request_api_version.0.write(writer)?;
        self.correlation_id.write(writer)?;
        self.client_id.write(writer)?;

        Ok(())
    }
}

/// Response header, version 0.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ResponseHeader {
    /// The correlation ID of this response.
    pub correlation_id: i32,
}

impl EncodedSize for ResponseHeader {
    fn encoded_size(&self) -> usize {
        4
    }
}

impl<R> ReadType<R> for ResponseHeader
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (correlation_id, remain) = i32::read(reader, remain)?;
        Ok((Self { correlation_id }, remain))
    }
}

// this is not technically required for production but helpful for testing
impl<W> WriteType<W> for ResponseHeader
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.correlation_id.write(writer)
    }
}
