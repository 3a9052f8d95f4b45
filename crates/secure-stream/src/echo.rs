//! Echo service
//!
//! Every accepted connection gets its own task: handshake as the listening
//! side, then copy decrypted bytes straight back until the peer closes.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, info_span, warn, Instrument};

use crate::{Incoming, SecureListener, SecureStream, StreamResult};

/// Pause after a failed accept
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept and echo connections until `shutdown` resolves
///
/// Connections already running are left to finish on their own tasks.
pub async fn serve<F>(listener: SecureListener, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    if let Ok(addr) = listener.local_addr() {
        info!("Echo service listening on {}", addr);
    }

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Echo service shutting down");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok(incoming) => {
                    let span = info_span!("connection", peer = %incoming.peer_addr());
                    tokio::spawn(handle_connection(incoming).instrument(span));
                }
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
        }
    }
}

async fn handle_connection(incoming: Incoming) {
    let buffer_size = incoming.config().read_buffer_size;

    let stream = match incoming.establish().await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Handshake failed: {}", e);
            return;
        }
    };
    info!("Secure channel established");

    match echo_stream(&stream, buffer_size).await {
        Ok(echoed) => info!("Peer closed after {} bytes", echoed),
        Err(e) => {
            warn!("Connection terminated: {}", e);
            return;
        }
    }

    if let Err(e) = stream.close().await {
        warn!("Shutdown failed: {}", e);
    }
}

/// Copy everything read from `stream` back into it until clean EOF
///
/// Returns the number of bytes echoed.
pub async fn echo_stream<S>(stream: &SecureStream<S>, buffer_size: usize) -> StreamResult<u64>
where
    S: AsyncRead + AsyncWrite,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut echoed = 0u64;

    while let Some(n) = stream.read(&mut buf).await? {
        if n == 0 {
            continue;
        }
        stream.write_all(&buf[..n]).await?;
        echoed += n as u64;
    }

    Ok(echoed)
}
