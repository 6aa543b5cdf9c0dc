//! ApiKey to tag request types.
//!
//! Only the APIs the lag monitor speaks get their own variant; anything else a peer sends is kept
//! as [`ApiKey::Unknown`].
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_api_keys>

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum ApiKey {
    ListOffsets,
    Metadata,
    OffsetFetch,
    ListGroups,
    Unknown(i16),
}

impl From<i16> for ApiKey {
    fn from(key: i16) -> Self {
        match key {
            2 => Self::ListOffsets,
            3 => Self::Metadata,
            9 => Self::OffsetFetch,
            16 => Self::ListGroups,
            _ => Self::Unknown(key),
        }
    }
}

impl From<ApiKey> for i16 {
    fn from(key: ApiKey) -> Self {
        match key {
            ApiKey::ListOffsets => 2,
            ApiKey::Metadata => 3,
            ApiKey::OffsetFetch => 9,
            ApiKey::ListGroups => 16,
            ApiKey::Unknown(code) => code,
        }
    }
}
