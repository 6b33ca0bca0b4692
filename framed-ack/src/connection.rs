//! Connection provider: host name resolution and TCP connect.
//!
//! [`connect`] resolves the host, takes the first address of the result, and
//! opens a stream to it.  No retry happens at this layer; any failure is
//! returned to the caller as a [`ConnError`].

use std::net::{Shutdown, SocketAddr};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Errors surfaced while establishing or tearing down a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnError {
    /// The resolver failed for `host`.
    #[error("failed to resolve {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: std::io::Error,
    },
    /// The resolver answered but returned no address.
    #[error("no address found for {host}")]
    NoAddress { host: String },
    /// The transport handshake did not complete.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnError {
    /// `true` for both resolver failure modes.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. } | Self::NoAddress { .. })
    }
}

/// A connected stream, owned by one exchange for its whole lifetime.
#[derive(Debug)]
pub struct Endpoint {
    /// Address the stream is connected to.
    pub peer_addr: SocketAddr,
    stream: TcpStream,
}

impl Endpoint {
    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self, ConnError> {
        let peer_addr = stream.peer_addr()?;
        Ok(Self { peer_addr, stream })
    }

    /// Mutable access to the underlying stream for I/O.
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Shut down both directions, then release the socket.
    ///
    /// Pending writes are flushed and a FIN sent before the read half is
    /// closed.  A peer that already went away makes the shutdown fail with
    /// `NotConnected`; the socket is still released.
    pub async fn close(mut self) -> Result<(), ConnError> {
        let flushed = self.stream.shutdown().await;
        let both = self
            .stream
            .into_std()
            .and_then(|stream| stream.shutdown(Shutdown::Both));
        match flushed.and(both) {
            Ok(()) => {
                log::debug!("closed connection to {}", self.peer_addr);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolve `host` and connect to the first address on `port`.
pub async fn connect(host: &str, port: u16) -> Result<Endpoint, ConnError> {
    let addr = resolve(host, port).await?;
    log::debug!("resolved {host}:{port} to {addr}");

    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| ConnError::Connect { addr, source })?;
    log::info!("connected to {addr}");
    Endpoint::from_stream(stream)
}

/// Resolve `host:port`, keeping only the first address of the result.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ConnError> {
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| ConnError::Resolution {
            host: host.to_owned(),
            source,
        })?
        .next()
        .ok_or_else(|| ConnError::NoAddress {
            host: host.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_ip_literal() {
        let addr = resolve("127.0.0.1", 8080).await.unwrap();
        assert_eq!(addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn unresolvable_host_is_a_resolution_error() {
        let err = resolve("no-such-host.invalid", 80).await.unwrap_err();
        assert!(err.is_resolution(), "got {err:?}");
    }

    #[tokio::test]
    async fn refused_connect_is_a_connect_error() {
        // Bind then drop to obtain a loopback port with no listener.
        let port = {
            let l = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().port()
        };
        let err = connect("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, ConnError::Connect { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn close_ends_the_stream_for_the_peer() {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let endpoint = connect("127.0.0.1", port).await.unwrap();
        let (mut peer, _) = listener.accept().await.unwrap();
        assert_eq!(endpoint.peer_addr.port(), port);

        endpoint.close().await.unwrap();

        let mut buf = [0u8; 16];
        let n = tokio::time::timeout(std::time::Duration::from_secs(5), peer.read(&mut buf))
            .await
            .expect("peer saw no end of stream")
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn close_after_peer_hangup_succeeds() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let endpoint = connect("127.0.0.1", port).await.unwrap();
        let (peer, _) = listener.accept().await.unwrap();
        drop(peer);

        endpoint.close().await.unwrap();
    }
}
