use std::fmt::Debug;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
#[cfg(feature = "transport-tls")]
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use pin_project_lite::pin_project;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tracing::debug;

#[cfg(feature = "transport-tls")]
pub type TlsConfig = Option<Arc<rustls::ClientConfig>>;

#[cfg(not(feature = "transport-tls"))]
pub type TlsConfig = ();

/// Turns a broker host name into addresses.
///
/// Without one, the runtime's resolver (`getaddrinfo`) is used.
#[async_trait]
pub trait Resolver: Send + Sync + Debug {
    async fn lookup_host(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("IO Error: {0}")]
    IO(#[from] io::Error),

    #[cfg(feature = "transport-tls")]
    #[error("Invalid Host-Server name: {0}")]
    BadServerName(#[from] rustls::pki_types::InvalidDnsNameError),

    #[error("Invalid host-port string: {0}")]
    InvalidHostPort(String),

    #[error("Name {0} resolved to no address")]
    NoAddress(String),

    #[error("Connecting timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(feature = "transport-tls")]
pin_project! {
    #[project = TransportProj]
    #[derive(Debug)]
    pub enum Transport {
        Plain{
            #[pin]
            inner: TcpStream,
        },

        Tls{
            #[pin]
            inner: Pin<Box<tokio_rustls::client::TlsStream<TcpStream>>>,
        },
    }
}

#[cfg(not(feature = "transport-tls"))]
pin_project! {
    #[project = TransportProj]
    #[derive(Debug)]
    pub enum Transport {
        Plain{
            #[pin]
            inner: TcpStream,
        },
    }
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.project() {
            TransportProj::Plain { inner } => inner.poll_read(cx, buf),

            #[cfg(feature = "transport-tls")]
            TransportProj::Tls { inner } => inner.poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.project() {
            TransportProj::Plain { inner } => inner.poll_write(cx, buf),

            #[cfg(feature = "transport-tls")]
            TransportProj::Tls { inner } => inner.poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            TransportProj::Plain { inner } => inner.poll_flush(cx),

            #[cfg(feature = "transport-tls")]
            TransportProj::Tls { inner } => inner.poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            TransportProj::Plain { inner } => inner.poll_shutdown(cx),

            #[cfg(feature = "transport-tls")]
            TransportProj::Tls { inner } => inner.poll_shutdown(cx),
        }
    }
}

impl Transport {
    /// Opens a TCP (and, with a TLS config, TLS) stream to `broker`, a `host:port` string.
    ///
    /// The whole handshake, name resolution included, is bounded by `timeout`.
    pub async fn connect(
        broker: &str,
        tls_config: TlsConfig,
        resolver: Option<&dyn Resolver>,
        timeout: Duration,
    ) -> Result<Self> {
        match tokio::time::timeout(timeout, Self::connect_inner(broker, tls_config, resolver)).await
        {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout(timeout)),
        }
    }

    async fn connect_inner(
        broker: &str,
        tls_config: TlsConfig,
        resolver: Option<&dyn Resolver>,
    ) -> Result<Self> {
        let tcp_stream = Self::connect_tcp(broker, resolver).await?;
        Self::wrap_tls(tcp_stream, broker, tls_config).await
    }

    async fn connect_tcp(broker: &str, resolver: Option<&dyn Resolver>) -> Result<TcpStream> {
        let Some(resolver) = resolver else {
            return Ok(TcpStream::connect(broker).await?);
        };

        let (host, port) = split_host_port(broker)?;
        let ips = resolver.lookup_host(host).await?;

        let mut last_err = None;
        for ip in ips {
            let addr = SocketAddr::new(ip, port);
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    debug!(%addr, %err, "Cannot connect to resolved address");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(err) => Err(err.into()),
            None => Err(Error::NoAddress(host.to_string())),
        }
    }

    #[cfg(feature = "transport-tls")]
    async fn wrap_tls(tcp_stream: TcpStream, broker: &str, tls_config: TlsConfig) -> Result<Self> {
        let config = match tls_config {
            Some(config) => config,
            None => return Ok(Self::Plain { inner: tcp_stream }),
        };

        let (host, _port) = split_host_port(broker)?;
        let server_name = rustls::pki_types::ServerName::try_from(host.to_string())?;

        let connector = tokio_rustls::TlsConnector::from(config);
        let tls_stream = connector.connect(server_name, tcp_stream).await?;

        Ok(Self::Tls {
            inner: Box::pin(tls_stream),
        })
    }

    #[cfg(not(feature = "transport-tls"))]
    async fn wrap_tls(tcp_stream: TcpStream, _broker: &str, _tls_config: TlsConfig) -> Result<Self> {
        Ok(Self::Plain { inner: tcp_stream })
    }
}

/// Splits `host:port`, stripping the brackets around IPv6 literals.
fn split_host_port(broker: &str) -> Result<(&str, u16)> {
    let (host, port) = broker
        .rsplit_once(':')
        .ok_or_else(|| Error::InvalidHostPort(broker.to_string()))?;

    let port = port
        .parse::<u16>()
        .map_err(|_| Error::InvalidHostPort(broker.to_string()))?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    Ok((host, port))
}
