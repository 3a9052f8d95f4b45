//! TCP dial and listen

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info};

use crate::{handshake, ChannelConfig, SecureStream, StreamError, StreamResult};

/// Connect to `addr` and run the handshake as the dialing side
pub async fn dial<A: ToSocketAddrs>(
    addr: A,
    config: &ChannelConfig,
) -> StreamResult<SecureStream<TcpStream>> {
    config.validate()?;

    let stream = TcpStream::connect(addr)
        .await
        .map_err(StreamError::ConnectionFailed)?;
    stream.set_nodelay(true).map_err(StreamError::ConnectionFailed)?;

    if let Ok(peer) = stream.peer_addr() {
        info!("Connected to {}", peer);
    }

    handshake(stream, config).await
}

/// TCP listener handing out connections that still need their handshake
///
/// Dropping the listener stops accepting.
pub struct SecureListener {
    listener: TcpListener,
    config: ChannelConfig,
}

impl SecureListener {
    pub async fn bind<A: ToSocketAddrs>(addr: A, config: ChannelConfig) -> StreamResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(StreamError::ConnectionFailed)?;
        Self::from_listener(listener, config)
    }

    pub fn from_listener(listener: TcpListener, config: ChannelConfig) -> StreamResult<Self> {
        config.validate()?;
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> StreamResult<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(StreamError::ConnectionFailed)
    }

    /// Wait for the next connection
    ///
    /// The handshake is not run here, so one slow peer cannot hold up the
    /// accept loop. Call [`Incoming::establish`] from the connection's task.
    pub async fn accept(&self) -> StreamResult<Incoming> {
        let (stream, peer_addr) = self
            .listener
            .accept()
            .await
            .map_err(StreamError::ConnectionFailed)?;
        stream.set_nodelay(true).map_err(StreamError::ConnectionFailed)?;
        debug!("Accepted connection from {}", peer_addr);

        Ok(Incoming {
            stream,
            peer_addr,
            config: self.config.clone(),
        })
    }
}

/// Accepted TCP connection awaiting its handshake
pub struct Incoming {
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: ChannelConfig,
}

impl Incoming {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Run the handshake as the listening side
    pub async fn establish(self) -> StreamResult<SecureStream<TcpStream>> {
        handshake(self.stream, &self.config).await
    }
}
