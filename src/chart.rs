pub mod epoch;
pub mod focus;
pub mod index;
pub mod overlay;
pub mod range;

use crate::surface::Surface;
use epoch::ChangeDetector;
use focus::FocusPositioner;
use index::KlineIndex;
use overlay::{OverlaySync, TradeMatching};

use data::chart::{ChartConfig, ChartKind, ViewRange};
use smallvec::SmallVec;
use store::{AccountId, ChartId, ChartRequest, ChartStatus, MarketStore, Stamped};

/// Fetch requests produced by one engine entry point, routed to the store by
/// the host. Most entry points produce at most one; a tick can produce two
/// (a backtest locate plus a focus retraction).
pub type Requests = SmallVec<[ChartRequest; 2]>;

/// Focus window width used before the surface has reported a resolved range.
const FALLBACK_VIEW_WIDTH: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Live,
    /// Replay against historical data; arms the one-shot locate of the
    /// first backtest trade.
    Backtest,
}

/// Everything fixed at session construction time.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub chart_id: ChartId,
    pub chart: ChartConfig,
    pub account: Option<AccountId>,
    pub mode: SessionMode,
    pub trade_matching: TradeMatching,
}

impl SessionConfig {
    pub fn new(chart_id: ChartId, chart: ChartConfig) -> Self {
        SessionConfig {
            chart_id,
            chart,
            account: None,
            mode: SessionMode::default(),
            trade_matching: TradeMatching::default(),
        }
    }

    #[must_use]
    pub fn with_account(mut self, account: AccountId) -> Self {
        self.account = Some(account);
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_trade_matching(mut self, matching: TradeMatching) -> Self {
        self.trade_matching = matching;
        self
    }
}

/// Per-chart synchronization context.
///
/// One instance per mounted chart; the host owns it and feeds it the four
/// external event kinds (store update ticks, configuration changes, surface
/// range reports, navigation). The session reads one store snapshot per
/// tick, drives the surface directly, and returns the fetch requests the
/// host must forward to the store.
pub struct ChartSession {
    chart_id: ChartId,
    config: ChartConfig,
    mode: SessionMode,
    account: Option<AccountId>,
    range: ViewRange,
    klines_seen: ChangeDetector,
    full_rescan: bool,
    overlay: OverlaySync,
    focus: FocusPositioner,
}

impl ChartSession {
    pub fn new(config: SessionConfig) -> Self {
        let focus_id = config.chart_id.focus_child();
        ChartSession {
            chart_id: config.chart_id,
            config: config.chart,
            mode: config.mode,
            account: config.account,
            range: ViewRange::unresolved(),
            klines_seen: ChangeDetector::new(),
            full_rescan: false,
            overlay: OverlaySync::new(config.trade_matching),
            focus: FocusPositioner::new(focus_id),
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn view_range(&self) -> ViewRange {
        self.range
    }

    /// Binds the surface to the configured identity and issues the initial
    /// rolling subscription. Call once after mounting.
    pub fn subscribe(&mut self, surface: &mut dyn Surface) -> Requests {
        surface.set_main_series(&self.config.instrument_id, self.config.duration, self.config.kind);
        surface.resize(self.config.width, self.config.height);
        self.full_rescan = true;

        let mut out = Requests::new();
        out.push(range::initial_request(&self.chart_id, &self.config));
        out
    }

    /// Applies a configuration change. An identity change (instrument,
    /// duration or kind) clears every overlay, rebinds the main series and
    /// re-subscribes; overlays are re-derived in full-rescan mode on the
    /// next tick, once data arrives. Size changes only resize the surface.
    pub fn set_config(&mut self, config: ChartConfig, surface: &mut dyn Surface) -> Requests {
        let identity_changed = !self.config.same_identity(&config);
        let size_changed = (self.config.width, self.config.height) != (config.width, config.height);
        self.config = config;

        let mut out = Requests::new();
        if identity_changed {
            surface.remove_mark_all();
            surface.set_main_series(
                &self.config.instrument_id,
                self.config.duration,
                self.config.kind,
            );
            self.range = ViewRange::unresolved();
            self.klines_seen.reset();
            self.full_rescan = true;
            out.push(range::initial_request(&self.chart_id, &self.config));
        }
        if size_changed {
            surface.resize(self.config.width, self.config.height);
        }
        out
    }

    /// Handles the surface's displayed-range report. Unresolved edges are
    /// ignored entirely; a resolved range is adopted and covered by a
    /// mode-appropriate fetch.
    pub fn view_range_changed(&mut self, range: ViewRange) -> Requests {
        let mut out = Requests::new();
        if !range.is_resolved() {
            return out;
        }

        self.range = range;
        if let Some(request) = range::plan_view_request(&self.chart_id, &self.config, range) {
            out.push(request);
        }
        out
    }

    /// External navigation: center the viewport on `datetime`. Repeatable.
    pub fn jump_to(&mut self, datetime: i64) -> Requests {
        let view_width = self.view_width();
        let mut out = Requests::new();
        out.push(self.focus.jump_request(
            &self.config.instrument_id,
            self.config.duration,
            datetime,
            view_width,
        ));
        out
    }

    /// Processes one store update tick against a single store snapshot.
    ///
    /// Order within the tick: the kline change check, then the three overlay
    /// reconciliations, then the backtest locate, then focus resolution, and
    /// last the main-chart follow-up (close-line window adoption and the
    /// gated redraw).
    pub fn tick<S: MarketStore>(&mut self, store: &S, surface: &mut dyn Surface) -> Requests {
        let mut out = Requests::new();

        let klines_changed = store
            .klines(&self.config.instrument_id, self.config.duration)
            .is_some_and(|series| self.klines_seen.has_changed(series.epoch()));

        let full_rescan = std::mem::take(&mut self.full_rescan);
        let symbol = self.config.instrument_id.clone();

        self.overlay
            .sync_position_line(store, self.account.as_ref(), &symbol, surface);
        self.overlay
            .sync_trade_arrows(store, self.account.as_ref(), &symbol, full_rescan, surface);
        self.overlay
            .sync_position_records(store, &symbol, full_rescan, surface);

        if let Some(request) = self.locate_backtest_trade(store) {
            out.push(request);
        }

        let focus_status = store.chart_status(self.focus.chart_id());
        if let Some(retract) = self.focus.poll_resolved(focus_status, &mut self.range, surface) {
            out.push(retract);
        } else {
            let status = store.chart_status(&self.chart_id);

            if self.config.kind == ChartKind::Close
                && let Some((left, right)) = status.and_then(ChartStatus::resolved)
            {
                self.range = ViewRange::new(left, right);
                surface.set_range(left, right);
            }

            if klines_changed && status.is_some_and(|status| !status.more_data) {
                surface.draw();
            }
        }

        out
    }

    /// Id/datetime lookups over the currently displayed window.
    pub fn kline_index<'a, S: MarketStore>(&self, store: &'a S) -> Option<KlineIndex<'a>> {
        store
            .klines(&self.config.instrument_id, self.config.duration)
            .map(|series| KlineIndex::new(series, self.range))
    }

    fn locate_backtest_trade<S: MarketStore>(&mut self, store: &S) -> Option<ChartRequest> {
        if self.mode != SessionMode::Backtest {
            return None;
        }
        let trades = store.trades(self.account.as_ref()?)?;
        let view_width = self.view_width();

        self.focus.locate_first_trade(
            trades,
            &self.config.instrument_id,
            self.config.duration,
            view_width,
        )
    }

    fn view_width(&self) -> u32 {
        if self.range.is_resolved() {
            (self.range.width() + 1) as u32
        } else {
            FALLBACK_VIEW_WIDTH
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;
    use store::{
        Direction, Duration, FetchIntent, Kline, MemoryStore, Offset, Position, Symbol, Trade,
    };

    fn symbol() -> Symbol {
        Symbol::new("SHFE", "au2006")
    }

    fn session(kind: ChartKind) -> ChartSession {
        let mut chart = ChartConfig::new(symbol(), Duration::MINUTE);
        chart.kind = kind;
        ChartSession::new(
            SessionConfig::new(ChartId::new("c"), chart).with_account(AccountId::from("sim")),
        )
    }

    fn bars(ids: std::ops::Range<i64>) -> Vec<Kline> {
        ids.map(|id| Kline::new(id, id * 60_000_000_000, 10.0, 11.0, 9.0, 10.5, 3.0))
            .collect()
    }

    fn filled_store(count: i64) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.begin_frame();
        store.insert_klines(&symbol(), Duration::MINUTE, &bars(0..count));
        store
    }

    #[test]
    fn draw_is_gated_on_series_epoch() {
        let mut session = session(ChartKind::Candle);
        let mut surface = HeadlessSurface::new();
        let mut store = filled_store(100);

        for request in session.subscribe(&mut surface) {
            store.request_chart(request);
        }
        store.resolve_charts();

        session.tick(&store, &mut surface);
        assert_eq!(surface.draws, 1);

        // same epoch again: no redraw
        session.tick(&store, &mut surface);
        assert_eq!(surface.draws, 1);

        store.begin_frame();
        store.insert_klines(&symbol(), Duration::MINUTE, &bars(100..101));
        store.resolve_charts();
        session.tick(&store, &mut surface);
        assert_eq!(surface.draws, 2);
    }

    #[test]
    fn identity_change_clears_overlays_before_rebuilding() {
        let mut session = session(ChartKind::Candle);
        let mut surface = HeadlessSurface::new();
        let mut store = filled_store(100);

        let account = AccountId::from("sim");
        store.upsert_trade(
            &account,
            Trade::new("t1", "SHFE", "au2006", Direction::Buy, Offset::Open, 389.5, 2, 0),
        );
        store.upsert_position(&account, &symbol(), Position::long(2, 389.5));

        for request in session.subscribe(&mut surface) {
            store.request_chart(request);
        }
        store.resolve_charts();
        session.tick(&store, &mut surface);
        assert_eq!(surface.trade_arrows.len(), 1);
        assert_eq!(surface.marks.len(), 1);

        let mut config = session.config().clone();
        config.duration = Duration::HOUR;
        let requests = session.set_config(config, &mut surface);

        assert!(surface.trade_arrows.is_empty());
        assert!(surface.marks.is_empty());
        assert!(matches!(
            requests[0].intent,
            FetchIntent::Rolling { view_width: range::INITIAL_VIEW_WIDTH }
        ));
        assert_eq!(requests[0].duration, Duration::HOUR);

        // no hour series yet: overlays for the position line re-derive on
        // the next tick, trades wait in full-rescan mode
        session.tick(&store, &mut surface);
        assert_eq!(surface.trade_arrows.len(), 1);
        assert_eq!(surface.marks.len(), 1);
    }

    #[test]
    fn size_change_only_resizes() {
        let mut session = session(ChartKind::Candle);
        let mut surface = HeadlessSurface::new();

        let mut config = session.config().clone();
        config.width = 1920;
        config.height = 1080;
        let requests = session.set_config(config, &mut surface);

        assert!(requests.is_empty());
        assert_eq!(surface.size, Some((1920, 1080)));
    }

    #[test]
    fn close_kind_adopts_trading_day_window() {
        let mut session = session(ChartKind::Close);
        let mut surface = HeadlessSurface::new();
        let mut store = filled_store(300);
        store
            .klines_mut(&symbol(), Duration::MINUTE)
            .unwrap()
            .trading_day_start_id = Some(180);

        for request in session.subscribe(&mut surface) {
            store.request_chart(request);
        }
        // the close line re-plans by trading day once a range is visible
        for request in session.view_range_changed(ViewRange::new(0, 299)) {
            store.request_chart(request);
        }
        store.resolve_charts();
        session.tick(&store, &mut surface);

        assert_eq!(surface.range, Some((180, 299)));
        assert_eq!(session.view_range(), ViewRange::new(180, 299));
    }

    #[test]
    fn unresolved_surface_range_is_ignored() {
        let mut session = session(ChartKind::Candle);

        assert!(session.view_range_changed(ViewRange::new(-1, -1)).is_empty());
        assert!(session.view_range_changed(ViewRange::new(5, -1)).is_empty());
        assert_eq!(session.view_range(), ViewRange::unresolved());
    }
}
