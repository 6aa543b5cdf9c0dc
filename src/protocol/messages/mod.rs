//! Request and response bodies.
//!
//! Each API is pinned to the single version the monitor speaks. Requests and responses both
//! encode and decode so that tests (and fake brokers) can drive either side of a round trip.

use std::io::Cursor;

use super::{
    api_key::ApiKey,
    api_version::ApiVersion,
    traits::{ReadType, WriteType},
};

mod header;
pub use header::*;
mod list_groups;
pub use list_groups::*;
mod list_offsets;
pub use list_offsets::*;
mod metadata;
pub use metadata::*;
mod offset_fetch;
pub use offset_fetch::*;

pub trait RequestBody: WriteType<Vec<u8>> {
    /// The response type that will follow when issuing this request.
    type ResponseBody: ReadType<Cursor<Vec<u8>>>;

    /// Kafka API key.
    ///
    /// This will be added to the request header.
    const API_KEY: ApiKey;

    /// The version of this API in which both the request and the response are encoded.
    const API_VERSION: ApiVersion;
}
