//! Replay counters

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::{Deserialize, Serialize};

use crate::config::MdCategory;
use crate::error::{ReplayError, Result};

/// Totals of one replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub events: u64,
    pub trades: u64,
    pub depth_updates: u64,
    pub timers_fired: u64,
    pub first_timestamp_ns: Option<u64>,
    pub last_timestamp_ns: Option<u64>,
}

impl ReplaySummary {
    pub fn record_event(&mut self, timestamp_ns: u64, category: MdCategory) {
        self.events += 1;
        match category {
            MdCategory::Trade => self.trades += 1,
            MdCategory::Depth => self.depth_updates += 1,
        }
        self.first_timestamp_ns.get_or_insert(timestamp_ns);
        self.last_timestamp_ns = Some(timestamp_ns);
    }

    /// Simulated time covered by the replayed events
    pub fn span_ns(&self) -> u64 {
        match (self.first_timestamp_ns, self.last_timestamp_ns) {
            (Some(first), Some(last)) => last - first,
            _ => 0,
        }
    }
}

/// Prometheus counters kept in a registry private to one driver
pub struct ReplayStats {
    registry: Registry,
    events: IntCounterVec,
    timers_fired: IntCounter,
}

impl ReplayStats {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let events = IntCounterVec::new(
            Opts::new("md_replay_events_total", "Replayed market data events"),
            &["category"],
        )?;
        let timers_fired = IntCounter::new("md_replay_timers_fired_total", "Timer callbacks fired")?;

        registry.register(Box::new(events.clone()))?;
        registry.register(Box::new(timers_fired.clone()))?;

        Ok(Self {
            registry,
            events,
            timers_fired,
        })
    }

    pub fn record_event(&self, category: MdCategory) {
        self.events.with_label_values(&[category.file_name()]).inc();
    }

    pub fn record_timer(&self) {
        self.timers_fired.inc();
    }

    pub fn events(&self, category: MdCategory) -> u64 {
        self.events.with_label_values(&[category.file_name()]).get()
    }

    pub fn timers_fired(&self) -> u64 {
        self.timers_fired.get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition of all counters
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| ReplayError::Invariant(format!("Metrics text is not UTF-8: {}", e)))
    }
}
