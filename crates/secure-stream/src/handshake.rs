//! Anonymous public key exchange
//!
//! Each side writes its 32-byte ephemeral public key and reads the peer's.
//! The write is started before the read, but both run concurrently, so the
//! exchange completes on any reliable duplex stream regardless of which side
//! the peer starts with. Nothing authenticates the peer.

use std::io;

use crypto_session::{KeyExchange, PUBLIC_KEY_SIZE};
use futures::future::try_join;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::debug;

use crate::{ChannelConfig, SecureStream, StreamError, StreamResult};

/// Run the key exchange on `stream` and wrap it in a secure channel
pub async fn handshake<S>(stream: S, config: &ChannelConfig) -> StreamResult<SecureStream<S>>
where
    S: AsyncRead + AsyncWrite,
{
    handshake_with(stream, KeyExchange::new()?, config).await
}

/// Like [`handshake`], with a caller-supplied ephemeral key pair
pub async fn handshake_with<S>(
    stream: S,
    exchange: KeyExchange,
    config: &ChannelConfig,
) -> StreamResult<SecureStream<S>>
where
    S: AsyncRead + AsyncWrite,
{
    config.validate()?;
    debug!("handshake: keys ready");

    let (mut reader, mut writer) = tokio::io::split(stream);
    let our_public = exchange.public_key();
    let exchanged = exchange_public_keys(&mut reader, &mut writer, &our_public);

    let their_public = match config.handshake_timeout() {
        Some(limit) => timeout(limit, exchanged)
            .await
            .map_err(|_| StreamError::HandshakeTimeout(limit))?,
        None => exchanged.await,
    }
    .map_err(StreamError::HandshakeFailed)?;
    debug!("handshake: public keys exchanged");

    let key = exchange.complete(&their_public);
    debug!("handshake: established");
    SecureStream::from_halves(reader, writer, key, config)
}

async fn exchange_public_keys<R, W>(
    reader: &mut R,
    writer: &mut W,
    our_public: &[u8; PUBLIC_KEY_SIZE],
) -> io::Result<[u8; PUBLIC_KEY_SIZE]>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let send = async {
        writer.write_all(our_public).await?;
        writer.flush().await
    };
    let receive = async {
        let mut their_public = [0u8; PUBLIC_KEY_SIZE];
        reader.read_exact(&mut their_public).await?;
        Ok::<_, io::Error>(their_public)
    };

    let ((), their_public) = try_join(send, receive).await?;
    Ok(their_public)
}
