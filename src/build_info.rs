//! Information gathered at build time.

/// Client ID sent to brokers when none is configured.
pub const DEFAULT_CLIENT_ID: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
