//! Write half: seals plaintext into records

use std::io;

use crypto_session::{NonceSource, SharedKey};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};
use wire_protocol::{RecordHeader, MAX_RECORD_SIZE, PRELUDE_SIZE, TAG_SIZE};
use zeroize::Zeroizing;

use crate::{ChannelConfig, StreamError, StreamResult};

/// Byte-stream writer that emits one sealed record per chunk
///
/// Concurrent callers are serialized, so the records of one `write` are
/// contiguous on the wire. Not cancellation-safe: dropping a `write` future
/// mid-record leaves the peer unable to parse the stream.
pub struct SecureWriter<W> {
    inner: Mutex<WriterState<W>>,
}

struct WriterState<W> {
    stream: W,
    key: SharedKey,
    nonces: NonceSource,
    /// Scratch space for one whole record, reused for every write
    record: Zeroizing<Vec<u8>>,
    max_record_plaintext: usize,
    chunking: bool,
    corrupted: bool,
    records_sent: u64,
}

impl<W: AsyncWrite + Unpin> SecureWriter<W> {
    /// Wrap `stream`, sealing with `key`
    pub fn new(stream: W, key: SharedKey, config: &ChannelConfig) -> StreamResult<Self> {
        config.validate()?;
        let nonces = NonceSource::new(config.nonce_strategy)?;
        debug!(
            nonce_strategy = ?nonces.strategy(),
            max_record_plaintext = config.max_record_plaintext,
            "writer ready"
        );

        Ok(Self {
            inner: Mutex::new(WriterState {
                stream,
                key,
                nonces,
                record: Zeroizing::new(vec![0u8; MAX_RECORD_SIZE]),
                max_record_plaintext: config.max_record_plaintext,
                chunking: config.chunking,
                corrupted: false,
                records_sent: 0,
            }),
        })
    }

    /// Seal and send `buf`, returning the number of plaintext bytes delivered
    ///
    /// The whole buffer is always delivered on success. An empty buffer still
    /// produces one (empty) record.
    pub async fn write(&self, buf: &[u8]) -> StreamResult<usize> {
        let mut state = self.inner.lock().await;
        state.write(buf).await
    }

    pub async fn write_all(&self, buf: &[u8]) -> StreamResult<()> {
        self.write(buf).await.map(|_| ())
    }

    /// Close the write direction of the underlying stream
    pub async fn shutdown(&self) -> StreamResult<()> {
        let mut state = self.inner.lock().await;
        state.stream.shutdown().await.map_err(StreamError::Write)
    }

    pub async fn records_sent(&self) -> u64 {
        self.inner.lock().await.records_sent
    }

    /// Unwrap the underlying stream
    pub fn into_inner(self) -> W {
        self.inner.into_inner().stream
    }
}

impl<W: AsyncWrite + Unpin> WriterState<W> {
    async fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        if self.corrupted {
            return Err(StreamError::StreamCorrupted);
        }

        if !self.chunking && buf.len() > self.max_record_plaintext {
            return Err(StreamError::MessageTooLong {
                size: buf.len(),
                max: self.max_record_plaintext,
            });
        }

        if buf.is_empty() {
            self.write_record(buf).await?;
        } else {
            let mut delivered = 0;
            for chunk in buf.chunks(self.max_record_plaintext) {
                if let Err(e) = self.write_record(chunk).await {
                    return Err(self.abandon_write(delivered, e));
                }
                delivered += chunk.len();
            }
        }

        if let Err(e) = self.stream.flush().await {
            self.corrupted = true;
            return Err(StreamError::Write(e));
        }

        Ok(buf.len())
    }

    async fn write_record(&mut self, chunk: &[u8]) -> StreamResult<()> {
        let nonce = self.nonces.next_nonce()?;
        let header = RecordHeader::for_plaintext(nonce, chunk.len())?;
        let body_end = PRELUDE_SIZE + chunk.len();
        let record_len = header.record_len();

        header.encode_into(&mut self.record[..PRELUDE_SIZE]);
        self.record[PRELUDE_SIZE..body_end].copy_from_slice(chunk);
        let tag = self
            .key
            .seal_in_place(&nonce, &mut self.record[PRELUDE_SIZE..body_end])?;
        self.record[body_end..body_end + TAG_SIZE].copy_from_slice(&tag);

        self.send(record_len).await?;
        self.records_sent += 1;
        trace!(plaintext_len = chunk.len(), record_len, "sent record");
        Ok(())
    }

    /// Push the first `len` bytes of the scratch record to the stream
    async fn send(&mut self, len: usize) -> StreamResult<()> {
        let mut written = 0;
        while written < len {
            match self.stream.write(&self.record[written..len]).await {
                Ok(0) => return Err(self.write_failed(written, io::ErrorKind::WriteZero.into())),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.write_failed(written, e)),
            }
        }
        Ok(())
    }

    fn write_failed(&mut self, written: usize, err: io::Error) -> StreamError {
        if written == 0 {
            return StreamError::Write(err);
        }

        warn!(written, error = %err, "record truncated on the wire");
        self.corrupted = true;
        StreamError::StreamCorrupted
    }

    /// Poison the writer if `delivered` bytes of the failed write already
    /// reached the wire
    fn abandon_write(&mut self, delivered: usize, err: StreamError) -> StreamError {
        if delivered == 0 || matches!(err, StreamError::StreamCorrupted) {
            return err;
        }

        warn!(delivered, error = %err, "write failed after partial delivery");
        self.corrupted = true;
        StreamError::StreamCorrupted
    }
}
