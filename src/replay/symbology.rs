//! Dense token ids for (exchange, symbol) pairs

use std::collections::BTreeMap;

/// Token id of one replayed instrument
pub type Tid = u32;

/// Interns (exchange, symbol) pairs into consecutive [`Tid`]s
#[derive(Debug, Clone, Default)]
pub struct MdSymbology {
    symbol_to_index: BTreeMap<(String, String), Tid>,
    index_to_symbol: Vec<(String, String)>,
}

impl MdSymbology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tid for the pair, assigning the next free one on first sight
    pub fn get_tid(&mut self, exchange: &str, symbol: &str) -> Tid {
        if let Some(tid) = self.lookup(exchange, symbol) {
            return tid;
        }

        let tid = self.index_to_symbol.len() as Tid;
        let key = (exchange.to_string(), symbol.to_string());
        self.symbol_to_index.insert(key.clone(), tid);
        self.index_to_symbol.push(key);
        tid
    }

    pub fn lookup(&self, exchange: &str, symbol: &str) -> Option<Tid> {
        self.symbol_to_index
            .get(&(exchange.to_string(), symbol.to_string()))
            .copied()
    }

    pub fn n_symbols(&self) -> usize {
        self.index_to_symbol.len()
    }

    /// All pairs with their tids, ordered by (exchange, symbol)
    pub fn symbols(&self) -> impl Iterator<Item = (&str, &str, Tid)> + '_ {
        self.symbol_to_index
            .iter()
            .map(|((exchange, symbol), &tid)| (exchange.as_str(), symbol.as_str(), tid))
    }

    /// (exchange, symbol) of a tid
    pub fn name_of(&self, tid: Tid) -> Option<(&str, &str)> {
        self.index_to_symbol
            .get(tid as usize)
            .map(|(exchange, symbol)| (exchange.as_str(), symbol.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tids_are_dense_and_stable() {
        let mut symbology = MdSymbology::new();
        assert_eq!(symbology.get_tid("binance", "BTCUSDT"), 0);
        assert_eq!(symbology.get_tid("binance", "ETHUSDT"), 1);
        assert_eq!(symbology.get_tid("binance", "BTCUSDT"), 0);
        assert_eq!(symbology.get_tid("okx", "BTCUSDT"), 2);

        assert_eq!(symbology.n_symbols(), 3);
        assert_eq!(symbology.name_of(1), Some(("binance", "ETHUSDT")));
        assert_eq!(symbology.name_of(3), None);
        assert_eq!(symbology.lookup("okx", "ETHUSDT"), None);
    }

    #[test]
    fn test_symbols_listing() {
        let mut symbology = MdSymbology::new();
        symbology.get_tid("okx", "A");
        symbology.get_tid("binance", "B");

        let listed: Vec<_> = symbology.symbols().collect();
        assert_eq!(listed, vec![("binance", "B", 1), ("okx", "A", 0)]);
    }
}
