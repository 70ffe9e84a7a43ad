use crate::surface::{Mark, MarkSide, POS_LONG_MARK, POS_SHORT_MARK, Surface};

use store::{AccountId, MarketStore, Stamped, Symbol, Trade};

/// How account trades are matched against the chart's symbol.
///
/// Feeds disagree on the trade key: some report a preformatted symbol field,
/// others only the exchange and instrument ids. The join over
/// `exchange_id.instrument_id` is the stricter default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradeMatching {
    #[default]
    ExchangeInstrument,
    ReportedSymbol,
}

impl TradeMatching {
    fn matches(self, trade: &Trade, symbol: &Symbol) -> bool {
        match self {
            TradeMatching::ExchangeInstrument => trade.exchange_symbol() == *symbol,
            TradeMatching::ReportedSymbol => trade.symbol == *symbol,
        }
    }
}

/// Reconciles the three overlay sets against store state, once per tick.
///
/// The position line is replace-style: both marks are re-derived from the
/// current position every pass. Trade arrows and position records are
/// additive and keyed, so a pass only has to add what is new; `full_rescan`
/// (the first tick after an identity change) walks the whole collection,
/// incremental passes only records stamped with the current epoch.
#[derive(Debug, Default)]
pub struct OverlaySync {
    pub matching: TradeMatching,
}

impl OverlaySync {
    pub fn new(matching: TradeMatching) -> Self {
        OverlaySync { matching }
    }

    pub fn sync_position_line<S: MarketStore>(
        &self,
        store: &S,
        account: Option<&AccountId>,
        symbol: &Symbol,
        surface: &mut dyn Surface,
    ) {
        let Some(account) = account else { return };
        let position = store.position(account, symbol);

        match position.filter(|pos| pos.volume_long > 0) {
            Some(pos) => surface.add_mark(Mark::position_line(
                POS_LONG_MARK,
                MarkSide::Long,
                pos.volume_long,
                pos.open_price_long,
            )),
            None => surface.remove_mark(POS_LONG_MARK),
        }

        match position.filter(|pos| pos.volume_short > 0) {
            Some(pos) => surface.add_mark(Mark::position_line(
                POS_SHORT_MARK,
                MarkSide::Short,
                pos.volume_short,
                pos.open_price_short,
            )),
            None => surface.remove_mark(POS_SHORT_MARK),
        }
    }

    pub fn sync_trade_arrows<S: MarketStore>(
        &self,
        store: &S,
        account: Option<&AccountId>,
        symbol: &Symbol,
        full_rescan: bool,
        surface: &mut dyn Surface,
    ) {
        let Some(trades) = account.and_then(|account| store.trades(account)) else {
            return;
        };
        let epoch = store.epoch();

        for (trade_id, trade) in trades {
            if trade.volume <= 0 || !self.matching.matches(trade, symbol) {
                continue;
            }
            if full_rescan || trade.epoch() == epoch {
                surface.add_trade_arrow(trade_id, trade);
            }
        }
    }

    pub fn sync_position_records<S: MarketStore>(
        &self,
        store: &S,
        symbol: &Symbol,
        full_rescan: bool,
        surface: &mut dyn Surface,
    ) {
        let epoch = store.epoch();

        for (datetime, snapshot) in store.snapshots() {
            if !full_rescan && snapshot.epoch() != epoch {
                continue;
            }
            if let Some(position) = snapshot.positions.get(symbol)
                && !position.is_empty()
            {
                surface.add_position_record(*datetime, position);
            }
        }
    }
}
