//! Stream file writer
//!
//! Produces the framed, gzip-compressed files the replay reads: every
//! message is MessagePack encoded and prefixed with its little-endian `u32`
//! length.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use tracing::debug;

use crate::error::{ReplayError, Result};
use crate::parser::{DepthMessage, DepthUpdate, SingleTradeMessage, Trade};

pub struct FrameWriter<W: Write> {
    inner: W,
    frames: u64,
}

impl FrameWriter<GzEncoder<BufWriter<File>>> {
    /// Create (or truncate) a gzip stream file at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        debug!(path = %path.display(), "Writing stream file");
        Ok(Self::new(GzEncoder::new(
            BufWriter::new(file),
            Compression::default(),
        )))
    }

    /// Write the gzip trailer and flush the file
    pub fn close(self) -> Result<()> {
        let encoder = self.finish()?;
        encoder.finish()?.flush()?;
        Ok(())
    }
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, frames: 0 }
    }

    /// Write one length-prefixed frame
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            ReplayError::Invariant(format!("Frame of {} bytes too large", payload.len()))
        })?;

        self.inner.write_all(&len.to_le_bytes())?;
        self.inner.write_all(payload)?;
        self.frames += 1;
        Ok(())
    }

    /// Serialize `message` as MessagePack into one frame
    pub fn write_message<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let data = rmp_serde::to_vec_named(message)?;
        self.write_frame(&data)
    }

    pub fn write_trade(&mut self, local_time_us: i64, trade: Trade) -> Result<()> {
        self.write_message(&SingleTradeMessage {
            local_time_us,
            message: trade,
        })
    }

    pub fn write_depth(&mut self, local_time_us: i64, update: DepthUpdate) -> Result<()> {
        self.write_message(&DepthMessage {
            local_time_us,
            message: update,
        })
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
