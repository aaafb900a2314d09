//! Buffered byte window over a blocking reader
//!
//! Frames are parsed straight out of the window: `ensure_available` grows it
//! until enough bytes are buffered, `commit` drops consumed bytes from the
//! front. A zero-length read marks the end of the stream.

use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::error::{ReplayError, Result};

/// Smallest read issued against the underlying reader
const MIN_READ: usize = 4096;
/// Largest single read; bounds how far a bogus length prefix can grow the window
const MAX_READ: usize = 64 * 1024;

pub struct Streamer<R> {
    buffer: BytesMut,
    /// `None` once the reader has reported end of stream
    reader: Option<R>,
}

impl<R: Read> Streamer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            buffer: BytesMut::new(),
            reader: Some(reader),
        }
    }

    /// Whether at least one more byte can be read
    pub fn has_data(&mut self) -> Result<bool> {
        if self.buffer.is_empty() {
            self.read_more(MIN_READ)?;
        }
        Ok(!self.buffer.is_empty())
    }

    /// Grow the window to at least `n` bytes.
    ///
    /// Running out of input first means the stream was cut mid-frame.
    pub fn ensure_available(&mut self, n: usize) -> Result<()> {
        while self.buffer.len() < n {
            let wanted = n - self.buffer.len();
            if self.read_more(wanted.clamp(MIN_READ, MAX_READ))? == 0 {
                return Err(ReplayError::MalformedFrame(format!(
                    "needed {} bytes, stream ended after {}",
                    n,
                    self.buffer.len()
                )));
            }
        }
        Ok(())
    }

    /// Eagerly buffer up to `max_bytes`, stopping early at end of stream
    pub fn fetch_up_to(&mut self, max_bytes: usize) -> Result<()> {
        while self.buffer.len() < max_bytes {
            if self.read_more((max_bytes - self.buffer.len()).min(MAX_READ))? == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Currently buffered, unconsumed bytes
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop `n` consumed bytes from the front of the window
    pub fn commit(&mut self, n: usize) -> Result<()> {
        if n > self.buffer.len() {
            return Err(ReplayError::Invariant(format!(
                "commit of {} bytes with only {} buffered",
                n,
                self.buffer.len()
            )));
        }
        self.buffer.advance(n);
        Ok(())
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Read up to `max_bytes` (at most `MAX_READ`) onto the end of the window,
    /// returning how many arrived
    fn read_more(&mut self, max_bytes: usize) -> Result<usize> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(0);
        };

        let start = self.buffer.len();
        self.buffer.resize(start + max_bytes.min(MAX_READ), 0);

        let read = loop {
            match reader.read(&mut self.buffer[start..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buffer.truncate(start);
                    return Err(e.into());
                }
            }
        };

        self.buffer.truncate(start + read);
        if read == 0 {
            self.reader = None;
        }
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out at most `chunk` bytes per read
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.chunk).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_empty_reader_has_no_data() {
        let mut streamer = Streamer::new(Cursor::new(Vec::new()));
        assert!(!streamer.has_data().unwrap());
        assert!(!streamer.has_data().unwrap());
    }

    #[test]
    fn test_ensure_and_commit() {
        let mut streamer = Streamer::new(Cursor::new(vec![1u8, 2, 3, 4, 5]));
        streamer.ensure_available(3).unwrap();
        assert_eq!(&streamer.data()[..3], &[1, 2, 3]);

        streamer.commit(3).unwrap();
        assert_eq!(streamer.data(), &[4, 5]);
        streamer.commit(2).unwrap();
        assert!(!streamer.has_data().unwrap());
    }

    #[test]
    fn test_ensure_across_short_reads() {
        let data: Vec<u8> = (0..100).collect();
        let mut streamer = Streamer::new(Trickle {
            data: data.clone(),
            pos: 0,
            chunk: 7,
        });

        streamer.ensure_available(50).unwrap();
        assert!(streamer.buffered() >= 50);
        assert_eq!(&streamer.data()[..50], &data[..50]);
    }

    #[test]
    fn test_truncated_stream_is_malformed() {
        let mut streamer = Streamer::new(Cursor::new(vec![0u8; 3]));
        assert!(matches!(
            streamer.ensure_available(4),
            Err(ReplayError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_huge_length_over_short_stream_is_malformed() {
        let mut streamer = Streamer::new(Cursor::new(vec![0u8; 8]));
        assert!(matches!(
            streamer.ensure_available(u32::MAX as usize),
            Err(ReplayError::MalformedFrame(_))
        ));
        assert_eq!(streamer.buffered(), 8);
        assert!(streamer.buffer.capacity() < 4 * MAX_READ);
    }

    #[test]
    fn test_large_request_is_read_in_chunks() {
        let data: Vec<u8> = (0..3 * MAX_READ).map(|i| i as u8).collect();
        let mut streamer = Streamer::new(Cursor::new(data.clone()));
        streamer.ensure_available(2 * MAX_READ + 1).unwrap();
        assert!(streamer.buffered() > 2 * MAX_READ);
        assert_eq!(streamer.data(), &data[..streamer.buffered()]);
    }

    #[test]
    fn test_over_commit_is_invariant() {
        let mut streamer = Streamer::new(Cursor::new(vec![0u8; 2]));
        streamer.ensure_available(2).unwrap();
        assert!(matches!(streamer.commit(3), Err(ReplayError::Invariant(_))));
    }

    #[test]
    fn test_fetch_up_to_stops_at_end() {
        let mut streamer = Streamer::new(Trickle {
            data: vec![9u8; 10],
            pos: 0,
            chunk: 3,
        });
        streamer.fetch_up_to(1024).unwrap();
        assert_eq!(streamer.buffered(), 10);
    }
}
