#![doc = include_str!("../README.md")]
#![deny(rust_2018_idioms)]
#![warn(
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::future_not_send,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

mod build_info;
pub mod config;
pub mod connection;
pub mod lag;
pub mod monitor;
pub mod observer;
pub mod offsets;
pub mod protocol;
mod throttle;

pub use build_info::DEFAULT_CLIENT_ID;
