use crate::surface::Surface;

use data::chart::ViewRange;
use rustc_hash::FxHashMap;
use store::{ChartId, ChartRequest, ChartStatus, Duration, Symbol, Trade};

/// Highlight mark dropped on the bar a focus fetch landed on.
pub const FOCUS_HIGHLIGHT: &str = "jump_target";

/// Drives the focus subscription: "place this datetime at the middle of the
/// screen", used once per session to auto-locate the first backtest trade
/// and any number of times for explicit jump-to-datetime navigation.
///
/// A focus fetch is consumed exactly once: when its status resolves, the
/// viewport is moved, a highlight bar is placed near the window midpoint and
/// the subscription is retracted so the store stops servicing it.
#[derive(Debug)]
pub struct FocusPositioner {
    chart_id: ChartId,
    located_backtest_trade: bool,
}

impl FocusPositioner {
    pub fn new(chart_id: ChartId) -> Self {
        FocusPositioner {
            chart_id,
            located_backtest_trade: false,
        }
    }

    pub fn chart_id(&self) -> &ChartId {
        &self.chart_id
    }

    /// Focus request placing `datetime` at the window's horizontal midpoint.
    pub fn jump_request(
        &self,
        symbol: &Symbol,
        duration: Duration,
        datetime: i64,
        view_width: u32,
    ) -> ChartRequest {
        ChartRequest::focus(
            self.chart_id.clone(),
            symbol.clone(),
            duration,
            datetime,
            view_width / 2,
            view_width,
        )
    }

    /// One-shot backtest locate: focuses the earliest account trade, then
    /// never fires again for this session.
    pub fn locate_first_trade(
        &mut self,
        trades: &FxHashMap<String, Trade>,
        symbol: &Symbol,
        duration: Duration,
        view_width: u32,
    ) -> Option<ChartRequest> {
        if self.located_backtest_trade {
            return None;
        }
        let trade = trades.values().min_by_key(|trade| trade.trade_date_time)?;

        self.located_backtest_trade = true;
        log::debug!(
            "locating first backtest trade {} at {}",
            trade.trade_id,
            data::util::format_datetime(trade.trade_date_time)
        );
        Some(self.jump_request(symbol, duration, trade.trade_date_time, view_width))
    }

    /// Consumes a resolved focus fetch: moves the viewport to the resolved
    /// window, highlights its midpoint and returns the retraction request.
    /// `None` while the fetch is still pending (or was never issued).
    pub fn poll_resolved(
        &mut self,
        status: Option<&ChartStatus>,
        range: &mut ViewRange,
        surface: &mut dyn Surface,
    ) -> Option<ChartRequest> {
        let (left, right) = status?.resolved()?;

        *range = ViewRange::new(left, right);
        surface.set_range(left, right);
        surface.add_highlight_bar(FOCUS_HIGHLIGHT, left + ((right - left) / 2 - 2).max(0));

        Some(ChartRequest::cancel(self.chart_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;
    use store::{Direction, FetchIntent, Offset};

    fn symbol() -> Symbol {
        Symbol::new("SHFE", "au2006")
    }

    fn trade(id: &str, datetime: i64) -> Trade {
        Trade::new(
            id,
            "SHFE",
            "au2006",
            Direction::Buy,
            Offset::Open,
            389.5,
            2,
            datetime,
        )
    }

    #[test]
    fn locate_fires_once_on_earliest_trade() {
        let mut focus = FocusPositioner::new(ChartId::new("c/focus"));
        let mut trades = FxHashMap::default();
        trades.insert("t2".to_string(), trade("t2", 9_000));
        trades.insert("t1".to_string(), trade("t1", 4_000));

        let request = focus
            .locate_first_trade(&trades, &symbol(), Duration::MINUTE, 100)
            .unwrap();
        assert_eq!(
            request.intent,
            FetchIntent::Focus {
                focus_datetime: 4_000,
                focus_position: 50,
                view_width: 100,
            }
        );

        assert!(
            focus
                .locate_first_trade(&trades, &symbol(), Duration::MINUTE, 100)
                .is_none()
        );
    }

    #[test]
    fn locate_waits_for_a_trade() {
        let mut focus = FocusPositioner::new(ChartId::new("c/focus"));
        let trades = FxHashMap::default();

        assert!(
            focus
                .locate_first_trade(&trades, &symbol(), Duration::MINUTE, 100)
                .is_none()
        );
        // no trade seen yet, so the one-shot is still armed
        let mut trades = FxHashMap::default();
        trades.insert("t1".to_string(), trade("t1", 4_000));
        assert!(
            focus
                .locate_first_trade(&trades, &symbol(), Duration::MINUTE, 100)
                .is_some()
        );
    }

    #[test]
    fn jump_requests_are_repeatable() {
        let focus = FocusPositioner::new(ChartId::new("c/focus"));
        let a = focus.jump_request(&symbol(), Duration::MINUTE, 7_000, 80);
        let b = focus.jump_request(&symbol(), Duration::MINUTE, 7_000, 80);
        assert_eq!(a, b);
    }

    #[test]
    fn resolved_focus_moves_highlights_and_retracts() {
        let mut focus = FocusPositioner::new(ChartId::new("c/focus"));
        let mut range = ViewRange::unresolved();
        let mut surface = HeadlessSurface::new();

        let pending = ChartStatus {
            left_id: Some(100),
            right_id: None,
            more_data: true,
        };
        assert!(
            focus
                .poll_resolved(Some(&pending), &mut range, &mut surface)
                .is_none()
        );

        let resolved = ChartStatus {
            left_id: Some(100),
            right_id: Some(199),
            more_data: false,
        };
        let retract = focus
            .poll_resolved(Some(&resolved), &mut range, &mut surface)
            .unwrap();

        assert_eq!(retract.intent, FetchIntent::Cancel);
        assert_eq!(range, ViewRange::new(100, 199));
        assert_eq!(surface.range, Some((100, 199)));
        // near left + width/2 - 2
        assert_eq!(surface.highlights[FOCUS_HIGHLIGHT], 147);
    }
}
