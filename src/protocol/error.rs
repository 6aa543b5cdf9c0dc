//! Error codes embedded in responses.
//!
//! These are data, not transport failures: a response carrying one decoded fine and the caller
//! decides what it means.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_error_codes>

use std::io::{Read, Write};

use thiserror::Error as ThisError;

use super::traits::{EncodedSize, ReadError, ReadType, WriteError, WriteType};

#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    #[error("The server experienced an unexpected error when processing the request.")]
    UnknownServerError,

    #[error("The requested offset is not within the range of offsets maintained by the server.")]
    OffsetOutOfRange,

    #[error("This server does not host this topic-partition.")]
    UnknownTopicOrPartition,

    #[error("There is no leader for this topic-partition as we are in the middle of a leadership election.")]
    LeaderNotAvailable,

    #[error("For requests intended only for the leader, this error indicates that the broker is not the current leader.")]
    NotLeaderOrFollower,

    #[error("The request timed out.")]
    RequestTimedOut,

    #[error("The broker is not available.")]
    BrokerNotAvailable,

    #[error("The replica is not available for the requested topic-partition.")]
    ReplicaNotAvailable,

    #[error("The coordinator is loading and hence can't process requests.")]
    CoordinatorLoadInProgress,

    #[error("The coordinator is not available.")]
    CoordinatorNotAvailable,

    #[error("This is not the correct coordinator.")]
    NotCoordinator,

    #[error("The configured groupId is invalid.")]
    InvalidGroupId,

    #[error("Topic authorization failed.")]
    TopicAuthorizationFailed,

    #[error("Group authorization failed.")]
    GroupAuthorizationFailed,

    #[error("Cluster authorization failed.")]
    ClusterAuthorizationFailed,

    #[error("The version of API is not supported.")]
    UnsupportedVersion,

    #[error("This most likely occurs because of a request being malformed by the client library.")]
    InvalidRequest,

    #[error("The group id does not exist.")]
    GroupIdNotFound,

    #[error("Unknown error code {0}")]
    Unknown(i16),
}

impl Error {
    /// Maps a wire code to an error, `0` meaning "no error".
    pub fn new(code: i16) -> Option<Self> {
        match code {
            0 => None,
            -1 => Some(Self::UnknownServerError),
            1 => Some(Self::OffsetOutOfRange),
            3 => Some(Self::UnknownTopicOrPartition),
            5 => Some(Self::LeaderNotAvailable),
            6 => Some(Self::NotLeaderOrFollower),
            7 => Some(Self::RequestTimedOut),
            8 => Some(Self::BrokerNotAvailable),
            9 => Some(Self::ReplicaNotAvailable),
            14 => Some(Self::CoordinatorLoadInProgress),
            15 => Some(Self::CoordinatorNotAvailable),
            16 => Some(Self::NotCoordinator),
            24 => Some(Self::InvalidGroupId),
            29 => Some(Self::TopicAuthorizationFailed),
            30 => Some(Self::GroupAuthorizationFailed),
            31 => Some(Self::ClusterAuthorizationFailed),
            35 => Some(Self::UnsupportedVersion),
            42 => Some(Self::InvalidRequest),
            69 => Some(Self::GroupIdNotFound),
            _ => Some(Self::Unknown(code)),
        }
    }

    pub fn code(&self) -> i16 {
        match self {
            Self::UnknownServerError => -1,
            Self::OffsetOutOfRange => 1,
            Self::UnknownTopicOrPartition => 3,
            Self::LeaderNotAvailable => 5,
            Self::NotLeaderOrFollower => 6,
            Self::RequestTimedOut => 7,
            Self::BrokerNotAvailable => 8,
            Self::ReplicaNotAvailable => 9,
            Self::CoordinatorLoadInProgress => 14,
            Self::CoordinatorNotAvailable => 15,
            Self::NotCoordinator => 16,
            Self::InvalidGroupId => 24,
            Self::TopicAuthorizationFailed => 29,
            Self::GroupAuthorizationFailed => 30,
            Self::ClusterAuthorizationFailed => 31,
            Self::UnsupportedVersion => 35,
            Self::InvalidRequest => 42,
            Self::GroupIdNotFound => 69,
            Self::Unknown(code) => *code,
        }
    }
}

impl EncodedSize for Option<Error> {
    fn encoded_size(&self) -> usize {
        2
    }
}

impl<R: Read> ReadType<R> for Option<Error> {
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError> {
        let (code, remain) = i16::read(reader, remain)?;
        Ok((Error::new(code), remain))
    }
}

impl<W: Write> WriteType<W> for Option<Error> {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.map(|e| e.code()).unwrap_or_default().write(writer)
    }
}

/// Error codes as a peer would send them, including `0` and codes we don't know.
#[cfg(test)]
pub(crate) fn arbitrary_error() -> impl proptest::strategy::Strategy<Value = Option<Error>> {
    use proptest::prelude::*;

    any::<i16>().prop_map(Error::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_code_roundtrip(code: i16) {
            let code2 = Error::new(code).map(|e| e.code()).unwrap_or_default();
            assert_eq!(code, code2);
        }
    }

    #[test]
    fn test_no_error() {
        assert_eq!(Error::new(0), None);
        assert_eq!(Error::new(16), Some(Error::NotCoordinator));
        assert_eq!(Error::new(1000), Some(Error::Unknown(1000)));
    }
}
