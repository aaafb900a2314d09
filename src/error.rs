//! Error types for the replay engine

use std::path::PathBuf;

use thiserror::Error;

/// Replay errors. Every variant is fatal for the run it occurs in.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Missing data file {path}: {source}")]
    MissingDataFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Message could not be verified: {0}")]
    Verification(String),

    #[error("No {category} callback registered for {symbol}")]
    MissingCallback {
        category: &'static str,
        symbol: String,
    },

    #[error("Unknown symbol {symbol} on {exchange}")]
    UnknownSymbol { exchange: String, symbol: String },

    #[error("Slot arena exhausted ({max_slots} slots)")]
    ArenaExhausted { max_slots: u32 },

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl From<rmp_serde::decode::Error> for ReplayError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        ReplayError::Verification(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for ReplayError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        ReplayError::Invariant(format!("Failed to encode message: {}", err))
    }
}

impl From<config::ConfigError> for ReplayError {
    fn from(err: config::ConfigError) -> Self {
        ReplayError::Config(err.to_string())
    }
}

impl From<chrono::ParseError> for ReplayError {
    fn from(err: chrono::ParseError) -> Self {
        ReplayError::Config(format!("Invalid replay date: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ReplayError>;
