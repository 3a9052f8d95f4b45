//! Established secure channel

use crypto_session::SharedKey;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};

use crate::{ChannelConfig, SecureReader, SecureWriter, StreamResult};

/// Duplex secure channel over one underlying stream
///
/// The read and write halves are independent: one task may read while
/// another writes. Both halves share a refcounted handle to the stream,
/// which is released once both are dropped.
pub struct SecureStream<S> {
    reader: SecureReader<ReadHalf<S>>,
    writer: SecureWriter<WriteHalf<S>>,
}

impl<S> SecureStream<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wrap a stream whose key exchange already happened
    pub fn new(stream: S, key: SharedKey, config: &ChannelConfig) -> StreamResult<Self> {
        let (reader, writer) = tokio::io::split(stream);
        Self::from_halves(reader, writer, key, config)
    }

    pub(crate) fn from_halves(
        reader: ReadHalf<S>,
        writer: WriteHalf<S>,
        key: SharedKey,
        config: &ChannelConfig,
    ) -> StreamResult<Self> {
        Ok(Self {
            writer: SecureWriter::new(writer, key.clone(), config)?,
            reader: SecureReader::new(reader, key),
        })
    }

    /// See [`SecureReader::read`]
    pub async fn read(&self, buf: &mut [u8]) -> StreamResult<Option<usize>> {
        self.reader.read(buf).await
    }

    pub async fn read_exact(&self, buf: &mut [u8]) -> StreamResult<()> {
        self.reader.read_exact(buf).await
    }

    pub async fn read_to_end(&self, out: &mut Vec<u8>) -> StreamResult<usize> {
        self.reader.read_to_end(out).await
    }

    /// See [`SecureWriter::write`]
    pub async fn write(&self, buf: &[u8]) -> StreamResult<usize> {
        self.writer.write(buf).await
    }

    pub async fn write_all(&self, buf: &[u8]) -> StreamResult<()> {
        self.writer.write_all(buf).await
    }

    pub fn reader(&self) -> &SecureReader<ReadHalf<S>> {
        &self.reader
    }

    pub fn writer(&self) -> &SecureWriter<WriteHalf<S>> {
        &self.writer
    }

    /// Separate the halves so they can move to different tasks
    pub fn split(self) -> (SecureReader<ReadHalf<S>>, SecureWriter<WriteHalf<S>>) {
        (self.reader, self.writer)
    }

    /// Shut the stream down and release it
    pub async fn close(self) -> StreamResult<()> {
        self.writer.shutdown().await
    }
}
