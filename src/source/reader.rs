//! Framed market-data stream source
//!
//! Each frame is a little-endian `u32` length followed by that many payload
//! bytes. One frame is decoded per `next_element` call; running out of bytes
//! exactly at a frame boundary is normal exhaustion.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bytes::Buf;
use flate2::read::MultiGzDecoder;
use tracing::debug;

use super::converter::Converter;
use super::streamer::Streamer;
use crate::collate::CollatorSource;
use crate::error::{ReplayError, Result};
use crate::parser::MdMessage;

const LENGTH_PREFIX: usize = 4;

/// Decompressed byte stream of an `.md.gz` file
pub type GzStream = MultiGzDecoder<BufReader<File>>;

/// Open a gzip stream file; a missing file is fatal for the replay
pub fn open_gz_stream(path: &Path) -> Result<GzStream> {
    let file = File::open(path).map_err(|source| ReplayError::MissingDataFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(MultiGzDecoder::new(BufReader::new(file)))
}

/// Source of decoded messages from one framed stream, tagged with `key`
pub struct MdStreamReader<R, C, K> {
    streamer: Streamer<R>,
    converter: C,
    key: K,
    frames: u64,
}

impl<R: Read, C: Converter, K: Clone> MdStreamReader<R, C, K> {
    pub fn new(streamer: Streamer<R>, converter: C, key: K) -> Self {
        Self {
            streamer,
            converter,
            key,
            frames: 0,
        }
    }

    /// Frames decoded so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl<R: Read, C: Converter, K: Clone> CollatorSource<MdMessage<K>> for MdStreamReader<R, C, K> {
    fn next_element(&mut self) -> Result<Option<MdMessage<K>>> {
        if !self.streamer.has_data()? {
            debug!(frames = self.frames, "Stream exhausted");
            return Ok(None);
        }

        self.streamer.ensure_available(LENGTH_PREFIX)?;
        let length = (&self.streamer.data()[..LENGTH_PREFIX]).get_u32_le() as usize;
        self.streamer.commit(LENGTH_PREFIX)?;

        self.streamer.ensure_available(length)?;
        let (local_timestamp_ns, update) = self.converter.load(&self.streamer.data()[..length])?;
        self.streamer.commit(length)?;

        self.frames += 1;
        Ok(Some(MdMessage {
            local_timestamp_ns,
            update,
            key: self.key.clone(),
        }))
    }
}
