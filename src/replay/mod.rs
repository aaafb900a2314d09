//! Replay module
//!
//! Wires configured stream files into a collator and drives the replay loop
//! over per-instrument handlers and timers.

mod callbacks;
mod driver;
mod loader;
mod stats;
mod symbology;

pub use callbacks::{DiffHandler, MdCallbacks, TradeHandler};
pub use driver::{DriverTimerHandle, ReplayDriver, TimerCallback};
pub use loader::{
    collator_from_config, collator_from_configs, name_for_stream, source_from_config,
    TidCollator, TidMessage,
};
pub use stats::{ReplayStats, ReplaySummary};
pub use symbology::{MdSymbology, Tid};
