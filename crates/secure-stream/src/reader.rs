//! Read half: opens records and buffers their plaintext

use std::io;
use std::ops::Range;

use crypto_session::SharedKey;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;
use tracing::{trace, warn};
use wire_protocol::{RecordHeader, MAX_CIPHERTEXT_LEN, PRELUDE_SIZE, TAG_SIZE};
use zeroize::Zeroizing;

use crate::{StreamError, StreamResult};

/// Byte-stream reader over sealed records
///
/// Records are sized by the sender, not by the caller's buffer: plaintext
/// that does not fit is kept and handed out by subsequent reads.
///
/// Not cancellation-safe: a `read` dropped while a record is being pulled
/// off the stream loses its place in the framing. The next call fails with
/// `StreamCorrupted` and the channel should be closed.
pub struct SecureReader<R> {
    inner: Mutex<ReaderState<R>>,
}

struct ReaderState<R> {
    stream: R,
    key: SharedKey,
    prelude: [u8; PRELUDE_SIZE],
    /// Ciphertext of the current record, decrypted in place
    record: Zeroizing<Vec<u8>>,
    /// Plaintext of the current record not yet returned
    pending: Range<usize>,
    /// Set while a record is being read; still set on entry means the
    /// previous call was dropped mid-record
    in_record: bool,
    failed: bool,
    records_received: u64,
}

impl<R: AsyncRead + Unpin> SecureReader<R> {
    /// Wrap `stream`, opening with `key`
    pub fn new(stream: R, key: SharedKey) -> Self {
        Self {
            inner: Mutex::new(ReaderState {
                stream,
                key,
                prelude: [0u8; PRELUDE_SIZE],
                record: Zeroizing::new(vec![0u8; MAX_CIPHERTEXT_LEN]),
                pending: 0..0,
                in_record: false,
                failed: false,
                records_received: 0,
            }),
        }
    }

    /// Read decrypted bytes into `buf`
    ///
    /// Returns `Ok(None)` once the peer closed the stream at a record
    /// boundary. `Ok(Some(n))` may be shorter than `buf`, and is `Some(0)`
    /// for an empty record. Any error ends the session: later calls fail
    /// with `StreamCorrupted`.
    pub async fn read(&self, buf: &mut [u8]) -> StreamResult<Option<usize>> {
        let mut state = self.inner.lock().await;
        state.read(buf).await
    }

    /// Fill `buf` completely, failing if the stream ends first
    pub async fn read_exact(&self, buf: &mut [u8]) -> StreamResult<()> {
        let mut state = self.inner.lock().await;
        let mut filled = 0;
        while filled < buf.len() {
            match state.read(&mut buf[filled..]).await? {
                Some(n) => filled += n,
                None => {
                    return Err(StreamError::Read(io::ErrorKind::UnexpectedEof.into()));
                }
            }
        }
        Ok(())
    }

    /// Append everything up to end-of-stream to `out`
    pub async fn read_to_end(&self, out: &mut Vec<u8>) -> StreamResult<usize> {
        let mut state = self.inner.lock().await;
        let start = out.len();
        loop {
            if !state.pending.is_empty() {
                out.extend_from_slice(&state.record[state.pending.clone()]);
                state.pending.start = state.pending.end;
            }
            if !state.next_record_or_fail().await? {
                return Ok(out.len() - start);
            }
        }
    }

    pub async fn records_received(&self) -> u64 {
        self.inner.lock().await.records_received
    }

    /// Unwrap the underlying stream, discarding any buffered plaintext
    pub fn into_inner(self) -> R {
        self.inner.into_inner().stream
    }
}

impl<R: AsyncRead + Unpin> ReaderState<R> {
    async fn read(&mut self, buf: &mut [u8]) -> StreamResult<Option<usize>> {
        if self.pending.is_empty() && !self.next_record_or_fail().await? {
            return Ok(None);
        }

        let available = &self.record[self.pending.clone()];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pending.start += n;
        Ok(Some(n))
    }

    async fn next_record_or_fail(&mut self) -> StreamResult<bool> {
        if self.in_record {
            warn!("read cancelled mid-record");
            self.failed = true;
        }
        if self.failed {
            return Err(StreamError::StreamCorrupted);
        }

        self.in_record = true;
        let result = self.next_record().await;
        self.in_record = false;
        if result.is_err() {
            self.failed = true;
            self.pending = 0..0;
        }
        result
    }

    /// Read, check and open one record. `Ok(false)` is a clean end-of-stream.
    async fn next_record(&mut self) -> StreamResult<bool> {
        let got = read_full(&mut self.stream, &mut self.prelude)
            .await
            .map_err(StreamError::Read)?;
        if got == 0 {
            return Ok(false);
        }

        let header = RecordHeader::decode(&self.prelude[..got])?;
        let len = header.ciphertext_len();

        let got = read_full(&mut self.stream, &mut self.record[..len])
            .await
            .map_err(StreamError::Read)?;
        if got < len {
            return Err(StreamError::TruncatedRecord {
                expected: len,
                actual: got,
            });
        }

        let plaintext_len = header.plaintext_len();
        let (body, tag_bytes) = self.record[..len].split_at_mut(plaintext_len);
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(tag_bytes);
        self.key.open_in_place(&header.nonce, body, &tag)?;

        self.pending = 0..plaintext_len;
        self.records_received += 1;
        trace!(plaintext_len, "received record");
        Ok(true)
    }
}

/// Read until `buf` is full or the stream ends, returning the bytes read
async fn read_full<R: AsyncRead + Unpin>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
