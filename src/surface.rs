use data::chart::ChartKind;
use data::util::format_price;
use store::{Duration, Position, Symbol, Trade};

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

pub const POS_LONG_MARK: &str = "pos_long";
pub const POS_SHORT_MARK: &str = "pos_short";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkSide {
    Long,
    Short,
}

/// A keyed overlay mark, currently always a horizontal price line.
/// Adding a mark under an id that is already present replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub id: String,
    pub price: f64,
    pub side: MarkSide,
    pub label: String,
}

impl Mark {
    pub fn position_line(id: &str, side: MarkSide, volume: i64, price: f64) -> Self {
        let word = match side {
            MarkSide::Long => "long",
            MarkSide::Short => "short",
        };
        Mark {
            id: id.to_string(),
            price,
            side,
            label: format!("{word} {volume} @ {}", format_price(price, 2)),
        }
    }
}

/// Command side of the rendering surface.
///
/// All overlay containers are keyed and idempotent: adding under an existing
/// key replaces, removing an absent key is a no-op. The engine relies on this
/// when it re-derives overlays from store state every tick.
pub trait Surface {
    /// Moves the displayed window to exactly `left_id..=right_id`.
    fn set_range(&mut self, left_id: i64, right_id: i64);

    fn resize(&mut self, width: u32, height: u32);

    /// Rebinds the main plot to a new (symbol, duration, kind) identity.
    fn set_main_series(&mut self, symbol: &Symbol, duration: Duration, kind: ChartKind);

    fn add_mark(&mut self, mark: Mark);

    fn remove_mark(&mut self, id: &str);

    /// Clears every overlay: marks, trade arrows, position records and
    /// highlight bars.
    fn remove_mark_all(&mut self);

    fn add_trade_arrow(&mut self, trade_id: &str, trade: &Trade);

    fn add_position_record(&mut self, datetime: i64, position: &Position);

    fn add_highlight_bar(&mut self, id: &str, kline_id: i64);

    /// Repaints the main series from the bound store data.
    fn draw(&mut self);
}

/// Surface implementation that renders nothing.
///
/// Backs headless hosts (backtest runners, tests): it records the would-be
/// drawing state in plain keyed containers so callers can inspect exactly
/// what a real surface would display.
#[derive(Default)]
pub struct HeadlessSurface {
    pub range: Option<(i64, i64)>,
    pub size: Option<(u32, u32)>,
    pub main_series: Option<(Symbol, Duration, ChartKind)>,
    pub marks: FxHashMap<String, Mark>,
    pub trade_arrows: FxHashMap<String, Trade>,
    pub position_records: BTreeMap<i64, Position>,
    pub highlights: FxHashMap<String, i64>,
    pub draws: u32,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        HeadlessSurface::default()
    }
}

impl Surface for HeadlessSurface {
    fn set_range(&mut self, left_id: i64, right_id: i64) {
        self.range = Some((left_id, right_id));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
    }

    fn set_main_series(&mut self, symbol: &Symbol, duration: Duration, kind: ChartKind) {
        self.main_series = Some((symbol.clone(), duration, kind));
    }

    fn add_mark(&mut self, mark: Mark) {
        self.marks.insert(mark.id.clone(), mark);
    }

    fn remove_mark(&mut self, id: &str) {
        self.marks.remove(id);
    }

    fn remove_mark_all(&mut self) {
        self.marks.clear();
        self.trade_arrows.clear();
        self.position_records.clear();
        self.highlights.clear();
    }

    fn add_trade_arrow(&mut self, trade_id: &str, trade: &Trade) {
        self.trade_arrows.insert(trade_id.to_string(), trade.clone());
    }

    fn add_position_record(&mut self, datetime: i64, position: &Position) {
        self.position_records.insert(datetime, position.clone());
    }

    fn add_highlight_bar(&mut self, id: &str, kline_id: i64) {
        self.highlights.insert(id.to_string(), kline_id);
    }

    fn draw(&mut self) {
        self.draws += 1;
    }
}
