use crate::{Duration, Epoch, Stamped, Symbol};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// One OHLCV bar. `id` is the bar's position in its series, assigned by the
/// data source; `datetime` is the bar open time in ns.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Kline {
    pub id: i64,
    pub datetime: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Kline {
    pub fn new(id: i64, datetime: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Kline {
            id,
            datetime,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Ordered bar series for one (symbol, duration) pair.
///
/// Bars are keyed by id; ids may be sparse at the frontier while a fetch is
/// in flight, but never internally. Id order implies non-decreasing datetime
/// order, enforced at insertion.
pub struct KlineSeries {
    symbol: Symbol,
    duration: Duration,
    pub datapoints: BTreeMap<i64, Kline>,
    /// True while older bars exist that the store has not loaded yet.
    pub more_data: bool,
    /// Bounds of the current trading day, present on daily-or-slower views.
    pub trading_day_start_id: Option<i64>,
    pub trading_day_end_id: Option<i64>,
    epoch: Epoch,
}

impl KlineSeries {
    pub fn new(symbol: Symbol, duration: Duration) -> Self {
        KlineSeries {
            symbol,
            duration,
            datapoints: BTreeMap::new(),
            more_data: true,
            trading_day_start_id: None,
            trading_day_end_id: None,
            epoch: Epoch::ZERO,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn get(&self, id: i64) -> Option<&Kline> {
        self.datapoints.get(&id)
    }

    pub fn first_id(&self) -> Option<i64> {
        self.datapoints.keys().next().copied()
    }

    /// Highest populated id, the series frontier.
    pub fn last_id(&self) -> Option<i64> {
        self.datapoints.keys().last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.datapoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.datapoints.len()
    }

    pub fn range(&self, ids: RangeInclusive<i64>) -> impl Iterator<Item = (i64, &Kline)> {
        self.datapoints.range(ids).map(|(id, kline)| (*id, kline))
    }

    /// Inserts bars, stamping the series with `epoch`. Bars that would break
    /// id/datetime monotonicity against their neighbors are dropped with a
    /// warning; replacing an existing id with updated OHLCV is fine.
    pub fn insert_klines(&mut self, klines: &[Kline], epoch: Epoch) {
        for kline in klines {
            if kline.id < 0 {
                log::warn!("{}: dropping bar with negative id {}", self.symbol, kline.id);
                continue;
            }

            let prev_ok = self
                .datapoints
                .range(..kline.id)
                .next_back()
                .is_none_or(|(_, prev)| prev.datetime <= kline.datetime);
            let next_ok = self
                .datapoints
                .range(kline.id + 1..)
                .next()
                .is_none_or(|(_, next)| kline.datetime <= next.datetime);

            if !prev_ok || !next_ok {
                log::warn!(
                    "{}: dropping bar id {} out of datetime order",
                    self.symbol,
                    kline.id
                );
                continue;
            }

            self.datapoints.insert(kline.id, *kline);
        }

        self.epoch = epoch;
    }

    /// True when every id in `left..=right` is populated. A chart window is
    /// only reported as resolved once its bars are contiguously loaded.
    pub fn is_loaded(&self, left: i64, right: i64) -> bool {
        if left > right {
            return false;
        }
        self.datapoints.range(left..=right).count() == (right - left + 1) as usize
    }
}

impl Stamped for KlineSeries {
    fn epoch(&self) -> Epoch {
        self.epoch
    }
}
