//! Configuration module for the replay engine

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{ReplayError, Result};

/// Kind of market data held in one stream file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MdCategory {
    #[serde(rename = "single_trades", alias = "trade")]
    Trade,
    #[serde(rename = "depth")]
    Depth,
}

impl MdCategory {
    /// Category segment used in stream file names
    pub fn file_name(&self) -> &'static str {
        match self {
            MdCategory::Trade => "trade",
            MdCategory::Depth => "depth",
        }
    }
}

/// One recorded stream to replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub category: MdCategory,
    pub symbol: String,
    pub exchange: String,
}

/// Time handed to a timer callback when it fires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerClock {
    /// Timestamp of the event whose arrival drained the timer
    #[default]
    EventTime,
    /// The call's own scheduled time
    ScheduledTime,
}

/// Replay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayConfig {
    /// Replay date as it appears in the stream file names
    pub date: String,

    /// Directory holding the `.md.gz` stream files
    pub data_dir: PathBuf,

    /// Streams to collate
    pub streams: Vec<StreamConfig>,

    #[serde(default)]
    pub timer_clock: TimerClock,

    /// Bytes eagerly buffered per source before replay starts
    #[serde(default = "default_prefetch_bytes")]
    pub prefetch_bytes: usize,

    /// Simulated-time interval between book summaries in the printer binary
    #[serde(default = "default_summary_interval_ms")]
    pub summary_interval_ms: u64,
}

fn default_prefetch_bytes() -> usize {
    1024 * 1024
}

fn default_summary_interval_ms() -> u64 {
    60_000
}

impl ReplayConfig {
    /// Load configuration from a JSON file, with `REPLAY_*` environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Json))
            .add_source(Environment::with_prefix("REPLAY"))
            .build()?;

        let config: ReplayConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: ReplayConfig = serde_json::from_str(raw)
            .map_err(|e| ReplayError::Config(format!("Invalid JSON config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the date and stream list
    pub fn validate(&self) -> Result<()> {
        self.replay_date()?;

        if self.streams.is_empty() {
            return Err(ReplayError::Config("No streams configured".to_string()));
        }

        for stream in &self.streams {
            if stream.symbol.trim().is_empty() || stream.exchange.trim().is_empty() {
                return Err(ReplayError::Config(format!(
                    "Stream {:?} needs both a symbol and an exchange",
                    stream
                )));
            }
        }

        if self.prefetch_bytes == 0 {
            return Err(ReplayError::Config(
                "prefetch_bytes must be positive".to_string(),
            ));
        }

        if self.summary_interval_ms == 0 {
            return Err(ReplayError::Config(
                "summary_interval_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Replay date, accepting both `2024-01-31` and `20240131`
    pub fn replay_date(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&self.date, "%Y%m%d"))
            .map_err(ReplayError::from)
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            date: "2024-01-01".to_string(),
            data_dir: PathBuf::from("./data"),
            streams: vec![
                StreamConfig {
                    category: MdCategory::Depth,
                    symbol: "BTCUSDT".to_string(),
                    exchange: "binance".to_string(),
                },
                StreamConfig {
                    category: MdCategory::Trade,
                    symbol: "BTCUSDT".to_string(),
                    exchange: "binance".to_string(),
                },
            ],
            timer_clock: TimerClock::EventTime,
            prefetch_bytes: default_prefetch_bytes(),
            summary_interval_ms: default_summary_interval_ms(),
        }
    }
}
