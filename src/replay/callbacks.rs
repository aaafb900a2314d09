//! Per-instrument event handlers and dispatch

use tracing::debug;

use super::loader::TidMessage;
use super::symbology::{MdSymbology, Tid};
use crate::config::MdCategory;
use crate::error::{ReplayError, Result};
use crate::parser::{DepthUpdate, MdPayload, Trade};

pub type TradeHandler<'a> = Box<dyn FnMut(u64, &Trade) -> Result<()> + 'a>;
pub type DiffHandler<'a> = Box<dyn FnMut(u64, &DepthUpdate) -> Result<()> + 'a>;

#[derive(Default)]
struct SymbolCallbacks<'a> {
    single_trade: Option<TradeHandler<'a>>,
    diff: Option<DiffHandler<'a>>,
}

/// Handlers for every instrument of a symbology, indexed by tid
pub struct MdCallbacks<'a> {
    symbology: MdSymbology,
    callbacks: Vec<SymbolCallbacks<'a>>,
}

impl<'a> MdCallbacks<'a> {
    pub fn new(symbology: MdSymbology) -> Self {
        let callbacks = (0..symbology.n_symbols())
            .map(|_| SymbolCallbacks::default())
            .collect();
        Self {
            symbology,
            callbacks,
        }
    }

    /// Handle trades of `exchange`/`symbol`, replacing any earlier handler
    pub fn on_trades<F>(&mut self, exchange: &str, symbol: &str, handler: F) -> Result<Tid>
    where
        F: FnMut(u64, &Trade) -> Result<()> + 'a,
    {
        let tid = self.tid_of(exchange, symbol)?;
        self.callbacks[tid as usize].single_trade = Some(Box::new(handler));
        debug!(exchange, symbol, tid, "Registered trade handler");
        Ok(tid)
    }

    /// Handle depth diffs of `exchange`/`symbol`, replacing any earlier handler
    pub fn on_diffs<F>(&mut self, exchange: &str, symbol: &str, handler: F) -> Result<Tid>
    where
        F: FnMut(u64, &DepthUpdate) -> Result<()> + 'a,
    {
        let tid = self.tid_of(exchange, symbol)?;
        self.callbacks[tid as usize].diff = Some(Box::new(handler));
        debug!(exchange, symbol, tid, "Registered diff handler");
        Ok(tid)
    }

    /// Route a message to its instrument's handler for that payload.
    ///
    /// A payload without a registered handler is a configuration error.
    pub fn handle_update(&mut self, msg: &TidMessage) -> Result<()> {
        let Some(callbacks) = self.callbacks.get_mut(msg.key as usize) else {
            return Err(ReplayError::Invariant(format!(
                "Message for unregistered tid {}",
                msg.key
            )));
        };

        let handled = match &msg.update {
            MdPayload::Trade(trade) => callbacks
                .single_trade
                .as_mut()
                .map(|handler| handler(msg.local_timestamp_ns, trade)),
            MdPayload::Depth(update) => callbacks
                .diff
                .as_mut()
                .map(|handler| handler(msg.local_timestamp_ns, update)),
        };

        handled.unwrap_or_else(|| Err(self.missing(msg.key, msg.update.category())))
    }

    pub fn symbology(&self) -> &MdSymbology {
        &self.symbology
    }

    fn tid_of(&self, exchange: &str, symbol: &str) -> Result<Tid> {
        self.symbology
            .lookup(exchange, symbol)
            .ok_or_else(|| ReplayError::UnknownSymbol {
                exchange: exchange.to_string(),
                symbol: symbol.to_string(),
            })
    }

    fn missing(&self, tid: Tid, category: MdCategory) -> ReplayError {
        let symbol = match self.symbology.name_of(tid) {
            Some((exchange, symbol)) => format!("{}/{}", exchange, symbol),
            None => format!("tid {}", tid),
        };
        ReplayError::MissingCallback {
            category: category.file_name(),
            symbol,
        }
    }
}
