// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Position-preserving stream helpers.
//!
//! Sources and sinks handed to a container are owned by the caller. These
//! helpers borrow them, put the read/write position back where they found it
//! and never close them.

use std::io::{self, SeekFrom};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

/// A seekable byte source accepted by `write_file`.
pub trait ReadSource: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T> ReadSource for T where T: AsyncRead + AsyncSeek + Send + Unpin + ?Sized {}

/// A seekable byte sink accepted by `read_file_into`.
pub trait WriteSink: AsyncWrite + AsyncSeek + Send + Unpin {}

impl<T> WriteSink for T where T: AsyncWrite + AsyncSeek + Send + Unpin + ?Sized {}

/// Byte stream returned by `read_file`. The caller owns and drops it.
pub type FileStream = Box<dyn AsyncRead + Send + Unpin>;

/// Read the whole source from offset 0, then restore its original position.
pub async fn read_from_start(source: &mut dyn ReadSource) -> io::Result<Vec<u8>> {
    let original = source.stream_position().await?;
    source.seek(SeekFrom::Start(0)).await?;

    let mut buffer = Vec::new();
    let read = source.read_to_end(&mut buffer).await;
    source.seek(SeekFrom::Start(original)).await?;
    read?;

    Ok(buffer)
}

/// Copy the whole source from offset 0 into `target`, then restore the source position.
pub async fn copy_from_start<W>(source: &mut dyn ReadSource, target: &mut W) -> io::Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let original = source.stream_position().await?;
    source.seek(SeekFrom::Start(0)).await?;

    let copied = tokio::io::copy(source, target).await;
    source.seek(SeekFrom::Start(original)).await?;
    let copied = copied?;

    target.flush().await?;
    Ok(copied)
}

/// Append `reader` to `sink` at its current position, then seek the sink back there.
pub async fn copy_preserving_position<R>(reader: &mut R, sink: &mut dyn WriteSink) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let original = sink.stream_position().await?;
    let copied = tokio::io::copy(reader, sink).await;
    sink.flush().await?;
    sink.seek(SeekFrom::Start(original)).await?;
    copied
}
