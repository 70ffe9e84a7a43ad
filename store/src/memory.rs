use crate::request::{ChartId, ChartRequest, ChartStatus, FetchIntent};
use crate::series::{Kline, KlineSeries};
use crate::{AccountId, Duration, Epoch, MarketStore, Position, Snapshot, Symbol, Trade};

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// In-process market data store.
///
/// Reference backend for tests and backtest hosts: the host plays the role
/// of the network layer by opening an update frame with [`begin_frame`],
/// mutating records (which stamps them with the frame's epoch), and calling
/// [`resolve_charts`] to service chart subscriptions from whatever bars are
/// resident. Chart requests supersede per [`ChartId`], so a request issued
/// while an older one is still unresolved simply replaces it.
///
/// [`begin_frame`]: MemoryStore::begin_frame
/// [`resolve_charts`]: MemoryStore::resolve_charts
#[derive(Default)]
pub struct MemoryStore {
    epoch: Epoch,
    klines: FxHashMap<(Symbol, Duration), KlineSeries>,
    trades: FxHashMap<AccountId, FxHashMap<String, Trade>>,
    positions: FxHashMap<AccountId, FxHashMap<Symbol, Position>>,
    snapshots: BTreeMap<i64, Snapshot>,
    charts: FxHashMap<ChartId, Subscription>,
}

struct Subscription {
    request: ChartRequest,
    status: ChartStatus,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Opens a new update frame. Everything mutated until the next call is
    /// stamped with the returned epoch.
    pub fn begin_frame(&mut self) -> Epoch {
        self.epoch = self.epoch.next();
        self.epoch
    }

    pub fn insert_klines(&mut self, symbol: &Symbol, duration: Duration, klines: &[Kline]) {
        let series = self
            .klines
            .entry((symbol.clone(), duration))
            .or_insert_with(|| KlineSeries::new(symbol.clone(), duration));
        series.insert_klines(klines, self.epoch);
    }

    pub fn klines_mut(&mut self, symbol: &Symbol, duration: Duration) -> Option<&mut KlineSeries> {
        self.klines.get_mut(&(symbol.clone(), duration))
    }

    pub fn upsert_trade(&mut self, account: &AccountId, mut trade: Trade) {
        trade.epoch = self.epoch;
        self.trades
            .entry(account.clone())
            .or_default()
            .insert(trade.trade_id.clone(), trade);
    }

    pub fn upsert_position(&mut self, account: &AccountId, symbol: &Symbol, mut position: Position) {
        position.epoch = self.epoch;
        self.positions
            .entry(account.clone())
            .or_default()
            .insert(symbol.clone(), position);
    }

    pub fn insert_snapshot(&mut self, mut snapshot: Snapshot) {
        snapshot.epoch = self.epoch;
        for position in snapshot.positions.values_mut() {
            position.epoch = self.epoch;
        }
        self.snapshots.insert(snapshot.datetime, snapshot);
    }

    /// Submits a chart request. Only the latest request per chart id is
    /// retained; its window state resets to pending until the next
    /// [`resolve_charts`](MemoryStore::resolve_charts).
    pub fn request_chart(&mut self, request: ChartRequest) {
        if request.intent == FetchIntent::Cancel {
            self.charts.remove(&request.chart_id);
            return;
        }

        log::debug!(
            "chart {}: {} {} {:?}",
            request.chart_id,
            request.symbol,
            request.duration,
            request.intent
        );
        self.charts.insert(
            request.chart_id.clone(),
            Subscription {
                request,
                status: ChartStatus::pending(),
            },
        );
    }

    /// Services every live subscription from the resident bar series,
    /// standing in for the data source answering fetches. A subscription
    /// whose series is absent, empty, or still gapped inside the window is
    /// left pending; it stalls until more bars arrive or a newer request
    /// supersedes it.
    pub fn resolve_charts(&mut self) {
        for sub in self.charts.values_mut() {
            let key = (sub.request.symbol.clone(), sub.request.duration);
            if let Some(series) = self.klines.get(&key) {
                sub.status = resolve(series, sub.request.intent);
            }
        }
    }

    /// Requests currently retained, for host-side introspection.
    pub fn live_requests(&self) -> impl Iterator<Item = &ChartRequest> {
        self.charts.values().map(|sub| &sub.request)
    }
}

/// Computes the window a subscription's intent lands on, clamping the right
/// edge to the series frontier. Pending status when the window cannot be
/// positioned or is not contiguously loaded yet.
fn resolve(series: &KlineSeries, intent: FetchIntent) -> ChartStatus {
    let (Some(first_id), Some(last_id)) = (series.first_id(), series.last_id()) else {
        return ChartStatus::pending();
    };

    let window = match intent {
        FetchIntent::Rolling { view_width } if view_width > 0 => {
            let left = (last_id - i64::from(view_width) + 1).max(first_id);
            Some((left, last_id))
        }
        FetchIntent::Anchored {
            left_kline_id,
            view_width,
        } if view_width > 0 => {
            let left = left_kline_id.max(0);
            (left <= last_id).then(|| {
                let right = (left + i64::from(view_width) - 1).min(last_id);
                (left, right)
            })
        }
        FetchIntent::Focus {
            focus_datetime,
            focus_position,
            view_width,
        } if view_width > 0 => series
            .range(first_id..=last_id)
            .find(|(_, kline)| kline.datetime >= focus_datetime)
            .map(|(target, _)| {
                let left = (target - i64::from(focus_position)).max(0);
                let right = (left + i64::from(view_width) - 1).min(last_id);
                (left, right)
            }),
        FetchIntent::TradingDay { .. } => {
            let left = series.trading_day_start_id.unwrap_or(first_id);
            let right = series.trading_day_end_id.unwrap_or(last_id);
            Some((left, right))
        }
        _ => None,
    };

    match window {
        Some((left, right)) => ChartStatus {
            left_id: Some(left),
            right_id: Some(right),
            more_data: !series.is_loaded(left, right),
        },
        None => ChartStatus::pending(),
    }
}

impl MarketStore for MemoryStore {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn klines(&self, symbol: &Symbol, duration: Duration) -> Option<&KlineSeries> {
        self.klines.get(&(symbol.clone(), duration))
    }

    fn position(&self, account: &AccountId, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(account)?.get(symbol)
    }

    fn trades(&self, account: &AccountId) -> Option<&FxHashMap<String, Trade>> {
        self.trades.get(account)
    }

    fn snapshots(&self) -> &BTreeMap<i64, Snapshot> {
        &self.snapshots
    }

    fn chart_status(&self, chart_id: &ChartId) -> Option<&ChartStatus> {
        self.charts.get(chart_id).map(|sub| &sub.status)
    }
}
