use crate::{Duration, Symbol};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-chosen chart subscription key. The store keeps at most one live
/// request per id; issuing a new request under the same id supersedes the
/// previous one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ChartId(String);

impl ChartId {
    pub fn new(id: &str) -> Self {
        ChartId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derived id for the one-shot focus subscription that rides alongside
    /// a main chart subscription.
    #[must_use]
    pub fn focus_child(&self) -> ChartId {
        ChartId(format!("{}/focus", self.0))
    }
}

impl From<&str> for ChartId {
    fn from(id: &str) -> Self {
        ChartId::new(id)
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a chart subscription asks the store to keep loaded.
///
/// The four fetch modes are mutually exclusive; `Cancel` drops the
/// subscription (the empty-instrument form of the wire request).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum FetchIntent {
    /// Latest `view_width` bars; the window follows newly created bars.
    Rolling { view_width: u32 },
    /// Fixed left edge, fixed width.
    Anchored { left_kline_id: i64, view_width: u32 },
    /// Place the bar nearest `focus_datetime` at screen offset
    /// `focus_position` (0 = leftmost) in a `view_width`-bar window.
    Focus {
        focus_datetime: i64,
        focus_position: u32,
        view_width: u32,
    },
    /// Window addressed by trading day rather than bar id. `trading_day_start`
    /// is a ns offset relative to the current trading day (0 = current,
    /// negative = earlier days); `trading_day_count` is a day count in ns.
    TradingDay {
        trading_day_start: i64,
        trading_day_count: i64,
    },
    Cancel,
}

/// One fetch request against the store, keyed by `chart_id`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChartRequest {
    pub chart_id: ChartId,
    pub symbol: Symbol,
    pub duration: Duration,
    pub intent: FetchIntent,
}

impl ChartRequest {
    pub fn rolling(chart_id: ChartId, symbol: Symbol, duration: Duration, view_width: u32) -> Self {
        ChartRequest {
            chart_id,
            symbol,
            duration,
            intent: FetchIntent::Rolling { view_width },
        }
    }

    pub fn anchored(
        chart_id: ChartId,
        symbol: Symbol,
        duration: Duration,
        left_kline_id: i64,
        view_width: u32,
    ) -> Self {
        ChartRequest {
            chart_id,
            symbol,
            duration,
            intent: FetchIntent::Anchored {
                left_kline_id,
                view_width,
            },
        }
    }

    pub fn focus(
        chart_id: ChartId,
        symbol: Symbol,
        duration: Duration,
        focus_datetime: i64,
        focus_position: u32,
        view_width: u32,
    ) -> Self {
        ChartRequest {
            chart_id,
            symbol,
            duration,
            intent: FetchIntent::Focus {
                focus_datetime,
                focus_position,
                view_width,
            },
        }
    }

    pub fn trading_day(
        chart_id: ChartId,
        symbol: Symbol,
        duration: Duration,
        trading_day_start: i64,
        trading_day_count: i64,
    ) -> Self {
        ChartRequest {
            chart_id,
            symbol,
            duration,
            intent: FetchIntent::TradingDay {
                trading_day_start,
                trading_day_count,
            },
        }
    }

    pub fn cancel(chart_id: ChartId) -> Self {
        ChartRequest {
            chart_id,
            symbol: Symbol::none(),
            duration: Duration::TICK,
            intent: FetchIntent::Cancel,
        }
    }
}

/// Store-reported state of a chart subscription's window.
///
/// Edge ids stay `None` until the store has positioned the window;
/// `more_data` stays true until every bar of the window is loaded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChartStatus {
    pub left_id: Option<i64>,
    pub right_id: Option<i64>,
    pub more_data: bool,
}

impl ChartStatus {
    pub fn pending() -> Self {
        ChartStatus {
            left_id: None,
            right_id: None,
            more_data: true,
        }
    }

    /// The fully loaded window, if the fetch has resolved.
    pub fn resolved(&self) -> Option<(i64, i64)> {
        if self.more_data {
            return None;
        }
        self.left_id.zip(self.right_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_resolves_only_when_complete() {
        assert_eq!(ChartStatus::pending().resolved(), None);

        let half = ChartStatus {
            left_id: Some(10),
            right_id: None,
            more_data: false,
        };
        assert_eq!(half.resolved(), None);

        let done = ChartStatus {
            left_id: Some(10),
            right_id: Some(40),
            more_data: false,
        };
        assert_eq!(done.resolved(), Some((10, 40)));
    }

    #[test]
    fn focus_child_id() {
        let id = ChartId::new("web_chart");
        assert_eq!(id.focus_child().as_str(), "web_chart/focus");
    }
}
