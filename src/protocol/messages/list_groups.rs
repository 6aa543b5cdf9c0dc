use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::ApiVersion;
use crate::protocol::error::Error;
use crate::protocol::messages::RequestBody;
use crate::protocol::traits::{EncodedSize, ReadError, ReadType, WriteError, WriteType};
#[cfg(test)]
use proptest::prelude::*;

/// Lists the groups coordinated by the receiving broker.
///
/// Version 1 has no request fields.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ListGroupsRequest;

impl EncodedSize for ListGroupsRequest {
    fn encoded_size(&self) -> usize {
        0
    }
}

impl<R> ReadType<R> for ListGroupsRequest
where
    R: Read,
{
    fn read(_reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        Ok((Self, remain))
    }
}

impl<W> WriteType<W> for ListGroupsRequest
where
    W: Write,
{
    fn write(&self, _writer: &mut W) -> Result<(), WriteError> {
        Ok(())
    }
}

impl RequestBody for ListGroupsRequest {
    type ResponseBody = ListGroupsResponse;

    const API_KEY: ApiKey = ApiKey::ListGroups;

    const API_VERSION: ApiVersion = ApiVersion::new(1);
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Group {
    /// The group ID.
    pub group_id: String,

    /// The group protocol type.
    pub protocol_type: String,
}

impl EncodedSize for Group {
    fn encoded_size(&self) -> usize {
        self.group_id.encoded_size() + self.protocol_type.encoded_size()
    }
}

impl<R> ReadType<R> for Group
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (group_id, remain) = String::read(reader, remain)?;
        let (protocol_type, remain) = String::read(reader, remain)?;

        Ok((
            Self {
                group_id,
                protocol_type,
            },
            remain,
        ))
    }
}

impl<W> WriteType<W> for Group
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.group_id.write(writer)?;
        self.protocol_type.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ListGroupsResponse {
    /// The duration in milliseconds for which the request was throttled due to a
    /// quota violation, or zero if the request did not violate any quota.
    pub throttle_time_ms: i32,

    /// The error code, or 0 if there was no error.
    #[cfg_attr(test, proptest(strategy = "crate::protocol::error::arbitrary_error()"))]
    pub error_code: Option<Error>,

    /// Each group in the response.
    #[cfg_attr(test, proptest(strategy = "prop::collection::vec(any::<Group>(), 0..4)"))]
    pub groups: Vec<Group>,
}

impl EncodedSize for ListGroupsResponse {
    fn encoded_size(&self) -> usize {
        4 + self.error_code.encoded_size() + self.groups.encoded_size()
    }
}

impl<R> ReadType<R> for ListGroupsResponse
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (throttle_time_ms, remain) = i32::read(reader, remain)?;
        let (error_code, remain) = Option::<Error>::read(reader, remain)?;
        let (groups, remain) = Vec::<Group>::read(reader, remain)?;

        Ok((
            Self {
                throttle_time_ms,
                error_code,
                groups,
            },
            remain,
        ))
    }
}

impl<W> WriteType<W> for ListGroupsResponse
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.throttle_time_ms.write(writer)?;
        self.error_code.write(writer)?;
        self.groups.write(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::protocol::test_utils::test_roundtrip;

    use super::*;

    test_roundtrip!(ListGroupsRequest, test_roundtrip_list_groups_request);

    test_roundtrip!(ListGroupsResponse, test_roundtrip_list_groups_response);

    #[test]
    fn response_bytes() {
        #[rustfmt::skip]
        let data = vec![
            0x00, 0x00, 0x00, 0x0A, // throttle
            0x00, 0x10,             // NOT_COORDINATOR
            0x00, 0x00, 0x00, 0x01,
            0x00, 0x01, b'g',
            0x00, 0x08, b'c', b'o', b'n', b's', b'u', b'm', b'e', b'r',
        ];
        let len = data.len();

        let (resp, remain) = ListGroupsResponse::read(&mut Cursor::new(data), len).unwrap();
        assert_eq!(remain, 0);
        assert_eq!(resp.throttle_time_ms, 10);
        assert_eq!(resp.error_code, Some(Error::NotCoordinator));
        assert_eq!(
            resp.groups,
            vec![Group {
                group_id: "g".to_string(),
                protocol_type: "consumer".to_string(),
            }]
        );
    }

    #[test]
    fn null_group_array_is_empty() {
        let data = vec![0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF];
        let (resp, remain) = ListGroupsResponse::read(&mut Cursor::new(data), 10).unwrap();
        assert_eq!(remain, 0);
        assert!(resp.groups.is_empty());
    }
}
