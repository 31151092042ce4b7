// ABOUTME: Provides length-prefixed frame I/O over the halves of an SMPP byte stream
// ABOUTME: Implements buffered PDU reads and writes that keep the stream frame-aligned

//! Length-prefixed frame I/O over the two halves of a byte stream.
//!
//! The session owns one reader and one writer. The reader accumulates
//! socket data into a buffer and carves out complete frames by the
//! `command_length` word; the writer serializes a PDU and flushes it
//! through a buffered stream so each PDU costs one syscall.

use bytes::{Bytes, BytesMut};
use std::io::{self, Cursor};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

use crate::codec::{CodecError, MAX_PDU_SIZE, PduHeader, peek_u32};
use crate::pdu::Pdu;

/// Reads PDUs from the stream's read half.
#[derive(Debug)]
pub struct FrameReader<R> {
    stream: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(stream: R) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read one PDU.
    ///
    /// Waits until a full frame is buffered. Returns `Ok(None)` when the
    /// peer closes the stream at a frame boundary; a close mid-frame is a
    /// length error. A frame that fails to parse has still been consumed,
    /// so the stream stays aligned for the next read.
    pub async fn read_pdu(&mut self) -> Result<Option<Pdu>, CodecError> {
        loop {
            if let Some(frame) = self.extract_frame()? {
                return Pdu::parse(&frame).map(Some);
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(CodecError::Incomplete);
            }
        }
    }

    /// Carve one complete frame out of the buffer, if one has arrived.
    fn extract_frame(&mut self) -> Result<Option<Bytes>, CodecError> {
        let mut cursor = Cursor::new(&self.buffer[..]);
        let declared = match peek_u32(&mut cursor) {
            Ok(value) => value,
            Err(_) => return Ok(None),
        };

        if declared < PduHeader::SIZE as u32 || declared > MAX_PDU_SIZE {
            return Err(CodecError::InvalidPduLength {
                length: declared,
                min: PduHeader::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        if self.buffer.len() < declared as usize {
            return Ok(None);
        }

        Ok(Some(self.buffer.split_to(declared as usize).freeze()))
    }
}

/// Writes PDUs to the stream's write half.
#[derive(Debug)]
pub struct FrameWriter<W> {
    stream: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(stream: W) -> Self {
        Self {
            stream: BufWriter::new(stream),
        }
    }

    /// Serialize and flush one PDU.
    pub async fn write_pdu(&mut self, pdu: &Pdu) -> io::Result<()> {
        self.stream.write_all(&pdu.to_bytes()).await?;
        self.stream.flush().await
    }

    /// Flush and shut down the write direction.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}
