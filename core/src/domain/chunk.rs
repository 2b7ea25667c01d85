// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Chunk Codec
//!
//! Splits byte streams into fixed-size [`FileChunk`]s and reassembles them.
//! The wire carries no sequence numbers, so chunks are concatenated strictly in
//! arrival order. Splitting is lazy: the sync [`split`] borrows its input and
//! the async [`read_chunks`] reuses one buffer, so memory stays bounded by the
//! chunk size regardless of file size.

use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Chunk size used by both server and client unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// One fragment of file content as it travels on the wire.
///
/// `size` always equals `content.len()` for chunks built with [`FileChunk::new`].
/// Receivers treat it as a hint and never cross-check it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChunk {
    pub content: Bytes,
    pub size: i32,
}

impl FileChunk {
    pub fn new(content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let size = i32::try_from(content.len()).unwrap_or(i32::MAX);
        Self { content, size }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Lazy iterator over fixed-size chunks of a borrowed byte slice.
///
/// Created by [`split`]. Calling [`split`] again restarts from the beginning.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    inner: std::slice::Chunks<'a, u8>,
}

impl Iterator for Chunks<'_> {
    type Item = FileChunk;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|part| FileChunk::new(Bytes::copy_from_slice(part)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Split `bytes` into chunks of at most `chunk_size` bytes.
///
/// A `chunk_size` of zero is clamped to one. Empty input yields no chunks.
pub fn split(bytes: &[u8], chunk_size: usize) -> Chunks<'_> {
    Chunks {
        inner: bytes.chunks(chunk_size.max(1)),
    }
}

/// Concatenate chunk contents in iteration order.
pub fn assemble<I>(chunks: I) -> Vec<u8>
where
    I: IntoIterator<Item = FileChunk>,
{
    chunks.into_iter().fold(Vec::new(), |mut out, chunk| {
        out.extend_from_slice(&chunk.content);
        out
    })
}

/// Read `reader` to EOF as a lazy stream of chunks.
///
/// Each read fills at most `chunk_size` bytes of one reused buffer. A zero-length
/// read ends the stream and is never emitted as a chunk.
pub fn read_chunks<R>(
    mut reader: R,
    chunk_size: usize,
) -> impl Stream<Item = io::Result<FileChunk>> + Send
where
    R: AsyncRead + Unpin + Send,
{
    let chunk_size = chunk_size.max(1);
    stream! {
        let mut buf = vec![0u8; chunk_size];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = FileChunk::new(Bytes::copy_from_slice(&buf[..n]));
                    yield Ok::<_, io::Error>(chunk);
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    }
}

/// Write every chunk of `chunks` to `writer` in arrival order.
///
/// Returns the number of bytes written. The writer is flushed but not shut down.
pub async fn write_chunks<W, S, E>(writer: &mut W, chunks: S) -> Result<u64, E>
where
    W: AsyncWrite + Unpin,
    S: Stream<Item = Result<FileChunk, E>>,
    E: From<io::Error>,
{
    futures::pin_mut!(chunks);
    let mut written = 0u64;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk.content).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;
    Ok(written)
}
