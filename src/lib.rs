//! md-replay - Market Data Replay Library
//!
//! Replays recorded trade and depth streams in global time order, fires
//! timers between events and rebuilds order books from depth diffs.

pub mod collate;
pub mod config;
pub mod error;
pub mod orderbook;
pub mod parser;
pub mod replay;
pub mod source;
pub mod timer;

pub use config::{MdCategory, ReplayConfig, StreamConfig, TimerClock};
pub use error::{ReplayError, Result};
pub use orderbook::{Bbo, BookManager, BookUpdater, UpdatedLevels};
pub use parser::{DepthUpdate, Level, MdMessage, MdPayload, Trade};
pub use replay::{MdCallbacks, MdSymbology, ReplayDriver, ReplaySummary, Tid};
