//! Buffered frame reader over a [`Transport`].
//!
//! The analyzer streams sweeps continuously, so reads are never matched to
//! commands. Bytes are appended to one receive buffer and complete frames
//! are peeled off the front with [`protocol::decode_frame`].

use std::time::Duration;

use rfmon_core::error::{Error, Result};
use rfmon_core::transport::Transport;

use crate::protocol::{self, DecodeResult, Frame};

/// Size of a single transport read.
const READ_CHUNK: usize = 4096;

/// Upper bound on reads per [`FrameReader::drain`], so a device that
/// streams faster than we decode cannot stall the caller.
const MAX_DRAIN_READS: usize = 16;

pub(crate) struct FrameReader {
    transport: Box<dyn Transport>,
    buf: Vec<u8>,
}

impl FrameReader {
    pub(crate) fn new(transport: Box<dyn Transport>) -> Self {
        FrameReader {
            transport,
            buf: Vec::new(),
        }
    }

    pub(crate) async fn send(&mut self, data: &[u8]) -> Result<()> {
        tracing::debug!(bytes = data.len(), "sending command");
        self.transport.send(data).await
    }

    /// Wait up to `timeout` for one read. Returns whether any bytes arrived.
    ///
    /// A read of zero bytes means the port went away.
    pub(crate) async fn fill(&mut self, timeout: Duration) -> Result<bool> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.transport.receive(&mut chunk, timeout).await {
            Ok(0) => {
                tracing::error!(pending = self.buf.len(), "analyzer stream ended");
                Err(Error::ConnectionLost)
            }
            Ok(n) => {
                self.buf.extend_from_slice(&chunk[..n]);
                Ok(true)
            }
            Err(Error::Timeout) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Append whatever the transport has already buffered, without waiting.
    pub(crate) async fn drain(&mut self) -> Result<()> {
        for _ in 0..MAX_DRAIN_READS {
            if !self.fill(Duration::ZERO).await? {
                break;
            }
        }
        Ok(())
    }

    /// Decode the next complete frame, dropping noise in front of it.
    pub(crate) fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match protocol::decode_frame(&self.buf) {
                DecodeResult::Frame { frame, consumed } => {
                    self.buf.drain(..consumed);
                    return Some(frame);
                }
                DecodeResult::Skip(n) => {
                    tracing::trace!(bytes = n, "skipping undecodable input");
                    self.buf.drain(..n);
                }
                DecodeResult::Incomplete => return None,
            }
        }
    }

    /// Throw away everything received so far.
    pub(crate) async fn discard_pending(&mut self) -> Result<()> {
        self.drain().await?;
        if !self.buf.is_empty() {
            tracing::debug!(bytes = self.buf.len(), "discarding pending input");
        }
        self.buf.clear();
        Ok(())
    }

    pub(crate) async fn close(&mut self) -> Result<()> {
        self.buf.clear();
        self.transport.close().await
    }
}
