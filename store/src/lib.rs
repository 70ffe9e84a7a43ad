pub mod memory;
pub mod request;
pub mod series;

pub use memory::MemoryStore;
pub use request::{ChartId, ChartRequest, ChartStatus, FetchIntent};
pub use series::{Kline, KlineSeries};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Store generation counter. Bumped once per update frame; every record
/// mutated within a frame is stamped with the frame's epoch, so "changed
/// this tick" is a single integer comparison instead of a rescan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub const ZERO: Epoch = Epoch(0);

    #[must_use]
    pub fn next(self) -> Epoch {
        Epoch(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable store records expose their generation stamp through this trait
/// rather than a public field, so alternative store backends can derive it
/// however they like (e.g. an atomic counter behind the accessor).
pub trait Stamped {
    fn epoch(&self) -> Epoch;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol {0:?} is missing the exchange prefix")]
    MissingExchange(String),
    #[error("symbol {0:?} is missing the instrument part")]
    MissingInstrument(String),
}

/// Instrument identifier in `EXCHANGE.instrument` form, e.g. `SHFE.au2006`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(exchange: &str, instrument: &str) -> Self {
        Symbol(format!("{exchange}.{instrument}"))
    }

    /// The empty symbol, used on the wire to drop a chart subscription.
    pub fn none() -> Self {
        Symbol(String::new())
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn exchange(&self) -> &str {
        self.0.split_once('.').map_or("", |(exchange, _)| exchange)
    }

    pub fn instrument(&self) -> &str {
        self.0
            .split_once('.')
            .map_or(self.0.as_str(), |(_, instrument)| instrument)
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some(("", _)) | None => Err(SymbolError::MissingExchange(s.to_string())),
            Some((_, "")) => Err(SymbolError::MissingInstrument(s.to_string())),
            Some(_) => Ok(Symbol(s.to_string())),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bar/chart period in nanoseconds. `0` is the tick period.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct Duration(i64);

impl Duration {
    pub const TICK: Duration = Duration(0);
    pub const SECOND: Duration = Duration(1_000_000_000);
    pub const MINUTE: Duration = Duration(60 * Self::SECOND.0);
    pub const HOUR: Duration = Duration(60 * Self::MINUTE.0);
    pub const DAY: Duration = Duration(24 * Self::HOUR.0);

    pub const fn from_nanos(nanos: i64) -> Self {
        Duration(nanos)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Daily-or-slower periods aggregate by trading day rather than wall
    /// clock, and their series carry trading-day window bounds.
    pub fn is_daily_or_slower(self) -> bool {
        self.0 >= Self::DAY.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("tick");
        }

        let mut secs = self.0 / Self::SECOND.0;
        for (unit, label) in [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")] {
            if secs >= unit {
                write!(f, "{}{label}", secs / unit)?;
                secs %= unit;
            }
        }
        if self.0 % Self::SECOND.0 != 0 {
            write!(f, "{}ns", self.0 % Self::SECOND.0)?;
        }
        Ok(())
    }
}

/// Trading account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        AccountId(id.to_string())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Offset {
    Open,
    Close,
    CloseToday,
}

/// A filled order as reported by the account feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Trade {
    pub trade_id: String,
    pub exchange_id: String,
    pub instrument_id: String,
    /// Symbol as reported by the feed; usually `exchange_id.instrument_id`,
    /// but some feeds report a differently formatted key.
    pub symbol: Symbol,
    pub direction: Direction,
    pub offset: Offset,
    pub price: f64,
    /// Filled lots.
    pub volume: i64,
    /// Fill time in ns; for daily-or-slower periods this is the trading day.
    pub trade_date_time: i64,
    #[serde(skip)]
    pub(crate) epoch: Epoch,
}

impl Trade {
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        trade_id: &str,
        exchange_id: &str,
        instrument_id: &str,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: i64,
        trade_date_time: i64,
    ) -> Self {
        Trade {
            trade_id: trade_id.to_string(),
            exchange_id: exchange_id.to_string(),
            instrument_id: instrument_id.to_string(),
            symbol: Symbol::new(exchange_id, instrument_id),
            direction,
            offset,
            price,
            volume,
            trade_date_time,
            epoch: Epoch::ZERO,
        }
    }

    /// Overrides the reported symbol for feeds that key trades differently
    /// than `exchange_id.instrument_id`.
    #[must_use]
    pub fn reported_as(mut self, symbol: Symbol) -> Self {
        self.symbol = symbol;
        self
    }

    /// Symbol derived from the exchange and instrument fields, independent
    /// of what the feed reported.
    pub fn exchange_symbol(&self) -> Symbol {
        Symbol::new(&self.exchange_id, &self.instrument_id)
    }
}

impl Stamped for Trade {
    fn epoch(&self) -> Epoch {
        self.epoch
    }
}

/// Net holding for one (account, symbol) pair.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub volume_long: i64,
    pub open_price_long: f64,
    pub volume_short: i64,
    pub open_price_short: f64,
    #[serde(skip)]
    pub(crate) epoch: Epoch,
}

impl Position {
    pub fn long(volume: i64, open_price: f64) -> Self {
        Position {
            volume_long: volume,
            open_price_long: open_price,
            ..Position::default()
        }
    }

    pub fn short(volume: i64, open_price: f64) -> Self {
        Position {
            volume_short: volume,
            open_price_short: open_price,
            ..Position::default()
        }
    }

    #[must_use]
    pub fn and_short(mut self, volume: i64, open_price: f64) -> Self {
        self.volume_short = volume;
        self.open_price_short = open_price;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.volume_long == 0 && self.volume_short == 0
    }
}

impl Stamped for Position {
    fn epoch(&self) -> Epoch {
        self.epoch
    }
}

/// Periodic account state capture: the positions held at one instant,
/// keyed by symbol. The store keeps snapshots ordered by capture time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    pub datetime: i64,
    pub positions: FxHashMap<Symbol, Position>,
    #[serde(skip)]
    pub(crate) epoch: Epoch,
}

impl Snapshot {
    pub fn new(datetime: i64) -> Self {
        Snapshot {
            datetime,
            positions: FxHashMap::default(),
            epoch: Epoch::ZERO,
        }
    }

    #[must_use]
    pub fn with_position(mut self, symbol: Symbol, position: Position) -> Self {
        self.positions.insert(symbol, position);
        self
    }
}

impl Stamped for Snapshot {
    fn epoch(&self) -> Epoch {
        self.epoch
    }
}

/// Read side of the market data store, as consumed by the sync engine.
///
/// The store mutates between update frames; the engine only ever reads one
/// frame's state per tick. Chart requests are fire-and-forget and routed to
/// the store by the host, so this trait is read-only.
pub trait MarketStore {
    /// Epoch of the current update frame.
    fn epoch(&self) -> Epoch;

    fn klines(&self, symbol: &Symbol, duration: Duration) -> Option<&KlineSeries>;

    fn position(&self, account: &AccountId, symbol: &Symbol) -> Option<&Position>;

    fn trades(&self, account: &AccountId) -> Option<&FxHashMap<String, Trade>>;

    /// Account state snapshots ordered by capture time.
    fn snapshots(&self) -> &BTreeMap<i64, Snapshot>;

    fn chart_status(&self, chart_id: &ChartId) -> Option<&ChartStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_roundtrip() {
        let symbol: Symbol = "SHFE.au2006".parse().unwrap();
        assert_eq!(symbol.exchange(), "SHFE");
        assert_eq!(symbol.instrument(), "au2006");
        assert_eq!(symbol.to_string(), "SHFE.au2006");
    }

    #[test]
    fn symbol_rejects_malformed() {
        assert_eq!(
            "au2006".parse::<Symbol>(),
            Err(SymbolError::MissingExchange("au2006".to_string()))
        );
        assert_eq!(
            ".au2006".parse::<Symbol>(),
            Err(SymbolError::MissingExchange(".au2006".to_string()))
        );
        assert_eq!(
            "SHFE.".parse::<Symbol>(),
            Err(SymbolError::MissingInstrument("SHFE.".to_string()))
        );
    }

    #[test]
    fn duration_display() {
        assert_eq!(Duration::TICK.to_string(), "tick");
        assert_eq!(Duration::MINUTE.to_string(), "1m");
        assert_eq!(Duration::from_nanos(90 * 1_000_000_000).to_string(), "1m30s");
        assert_eq!(Duration::DAY.to_string(), "1d");
        assert_eq!(
            Duration::from_nanos(26 * 3_600 * 1_000_000_000).to_string(),
            "1d2h"
        );
    }

    #[test]
    fn trade_symbol_keys() {
        let trade = Trade::new(
            "t1",
            "SHFE",
            "au2006",
            Direction::Buy,
            Offset::Open,
            389.5,
            2,
            1_000,
        );
        assert_eq!(trade.symbol, Symbol::new("SHFE", "au2006"));
        assert_eq!(trade.exchange_symbol(), trade.symbol);

        let renamed = trade.reported_as(Symbol::new("SHFE", "au.HOT"));
        assert_ne!(renamed.symbol, renamed.exchange_symbol());
    }
}
