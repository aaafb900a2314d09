//! Market data stream sources
//!
//! Reads framed, gzip-compressed stream files and decodes them into
//! timestamped messages for the collator.

mod converter;
mod reader;
mod streamer;
mod writer;

pub use converter::{converter_for, Converter, DepthMessageConverter, SingleTradeConverter};
pub use reader::{open_gz_stream, GzStream, MdStreamReader};
pub use streamer::Streamer;
pub use writer::FrameWriter;
