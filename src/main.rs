//! md-replay - Market Data Replay Printer
//!
//! Replays the configured trade and depth streams, maintaining one order
//! book per instrument and logging a book summary at a fixed interval of
//! replay time.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use anyhow::Context;
use chrono::TimeZone;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use md_replay::config::{MdCategory, ReplayConfig};
use md_replay::orderbook::BookManager;
use md_replay::replay::{
    collator_from_config, DriverTimerHandle, MdCallbacks, MdSymbology, ReplayDriver,
};

/// Periodic book summary, rescheduled from its own timer callback
struct SummaryPrinter {
    books: Rc<RefCell<BookManager>>,
    symbology: MdSymbology,
    interval_ns: u64,
    /// A call is queued; keeps a single chain of summaries alive
    pending: Cell<bool>,
    handle: RefCell<Option<DriverTimerHandle>>,
}

impl SummaryPrinter {
    fn install(self: &Rc<Self>, driver: &ReplayDriver) -> md_replay::Result<()> {
        let weak: Weak<SummaryPrinter> = Rc::downgrade(self);
        let handle = driver.timer_handle(move |at| match weak.upgrade() {
            Some(printer) => printer.on_timer(at),
            None => Ok(()),
        });

        // Scheduled at 0; the first real timestamp moves it forward
        self.pending.set(true);
        handle.schedule_call_at(0)?;
        *self.handle.borrow_mut() = Some(handle);
        Ok(())
    }

    fn on_timer(&self, at: u64) -> md_replay::Result<()> {
        self.pending.set(false);
        self.log_books(at);

        if let Some(handle) = self.handle.borrow().as_ref() {
            if !self.pending.get() {
                self.pending.set(true);
                handle.schedule_call_at(at + self.interval_ns)?;
            }
        }
        Ok(())
    }

    fn log_books(&self, at: u64) {
        let time = format_replay_time(at);
        let books = self.books.borrow();

        for tid in books.tids() {
            let Some((exchange, symbol)) = self.symbology.name_of(tid) else {
                continue;
            };
            let Some(state) = books.state(tid, symbol) else {
                continue;
            };

            info!(
                time = %time,
                exchange,
                symbol,
                mid = ?state.metrics.mid_price,
                spread_bps = ?state.metrics.spread_bps,
                imbalance = ?state.metrics.imbalance,
                bid_levels = state.metrics.bid_levels,
                ask_levels = state.metrics.ask_levels,
                "Book summary"
            );
        }
    }
}

/// RFC 3339 for timestamps chrono can represent, raw nanoseconds otherwise
fn format_replay_time(at: u64) -> String {
    match i64::try_from(at) {
        Ok(ns) => chrono::Utc.timestamp_nanos(ns).to_rfc3339(),
        Err(_) => format!("{}ns", at),
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting md-replay");

    if let Err(e) = run() {
        error!(error = %format!("{:#}", e), "Replay failed");
        return Err(e);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("REPLAY_CONFIG").ok())
        .map(PathBuf::from)
        .context("usage: md-replay <config.json> (or set REPLAY_CONFIG)")?;

    let config = ReplayConfig::load(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    info!(date = %config.date, streams = config.streams.len(), "Configuration loaded");

    let mut symbology = MdSymbology::new();
    let mut collator = collator_from_config(&config, &mut symbology)?;
    let mut driver = ReplayDriver::from_config(&config)?;

    let books = Rc::new(RefCell::new(BookManager::new()));
    let mut callbacks = MdCallbacks::new(symbology.clone());

    for stream in &config.streams {
        let tid = symbology
            .lookup(&stream.exchange, &stream.symbol)
            .context("stream missing from symbology")?;

        match stream.category {
            MdCategory::Depth => {
                let books = books.clone();
                callbacks.on_diffs(&stream.exchange, &stream.symbol, move |ts, update| {
                    books.borrow_mut().apply(tid, ts, update);
                    Ok(())
                })?;
            }
            MdCategory::Trade => {
                callbacks.on_trades(&stream.exchange, &stream.symbol, move |ts, trade| {
                    debug!(
                        tid,
                        ts,
                        price = trade.price,
                        size = trade.size,
                        buy = trade.buy,
                        "Trade"
                    );
                    Ok(())
                })?;
            }
        }
    }

    let printer = Rc::new(SummaryPrinter {
        books: books.clone(),
        symbology,
        interval_ns: config.summary_interval_ms.saturating_mul(1_000_000),
        pending: Cell::new(false),
        handle: RefCell::new(None),
    });
    printer.install(&driver)?;

    let summary = driver.replay_all(&mut collator, &mut callbacks)?;
    if let Some(last) = summary.last_timestamp_ns {
        printer.log_books(last);
    }

    info!(summary = %serde_json::to_string(&summary)?, "Replay summary");
    debug!(metrics = %driver.stats().encode_text()?, "Replay counters");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_replay_time() {
        assert_eq!(
            format_replay_time(1_704_153_600_000_000_000),
            "2024-01-02T00:00:00+00:00"
        );
        assert_eq!(format_replay_time(u64::MAX), "18446744073709551615ns");
        assert_eq!(
            format_replay_time(i64::MAX as u64 + 1),
            "9223372036854775808ns"
        );
    }
}
