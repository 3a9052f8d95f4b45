//! Test doubles for the underlying stream

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use crypto_session::{KeyExchange, SharedKey};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Both ends of a completed key exchange
pub(crate) fn shared_keys() -> (SharedKey, SharedKey) {
    let ours = KeyExchange::new().unwrap();
    let theirs = KeyExchange::new().unwrap();
    let our_public = ours.public_key();
    let their_public = theirs.public_key();
    (ours.complete(&their_public), theirs.complete(&our_public))
}

/// Serves a fixed byte sequence at most `chunk` bytes per read
pub(crate) struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ChunkedReader {
    pub(crate) fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self { data, pos: 0, chunk }
    }
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let remaining = &this.data[this.pos..];
        let n = remaining.len().min(this.chunk).min(buf.remaining());
        buf.put_slice(&remaining[..n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

/// Accepts `limit` bytes, then fails every write
pub(crate) struct ShortWriter {
    pub(crate) written: Vec<u8>,
    limit: usize,
}

impl ShortWriter {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            written: Vec::new(),
            limit,
        }
    }
}

impl AsyncWrite for ShortWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let room = this.limit - this.written.len();
        if room == 0 {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "peer went away",
            )));
        }
        let n = room.min(buf.len());
        this.written.extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
