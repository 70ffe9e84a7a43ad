use data::chart::{ChartConfig, ChartKind, ViewRange};
use store::{ChartId, ChartRequest, Duration};

/// Bars requested when a chart identity is first subscribed.
pub const INITIAL_VIEW_WIDTH: u32 = 1000;

/// Trading days kept loaded for the close-line view.
pub const INTRADAY_DAYS: i64 = 1;

/// Subscription issued on mount and after every identity change: latest
/// bars, window following the frontier.
pub fn initial_request(chart_id: &ChartId, config: &ChartConfig) -> ChartRequest {
    ChartRequest::rolling(
        chart_id.clone(),
        config.instrument_id.clone(),
        config.duration,
        INITIAL_VIEW_WIDTH,
    )
}

/// Plans the fetch that keeps a reported viewport covered.
///
/// Close-line charts always show the most recent trading day(s), so the
/// request is addressed by trading day. Candle charts get an anchored window
/// prefetching one screen width to the left and keeping triple the visible
/// width loaded, which amortizes leftward scrolling.
///
/// Unresolved and degenerate ranges plan nothing.
pub fn plan_view_request(
    chart_id: &ChartId,
    config: &ChartConfig,
    range: ViewRange,
) -> Option<ChartRequest> {
    if !range.is_resolved() {
        return None;
    }

    match config.kind {
        ChartKind::Close => Some(ChartRequest::trading_day(
            chart_id.clone(),
            config.instrument_id.clone(),
            config.duration,
            Duration::DAY.as_nanos() * (1 - INTRADAY_DAYS),
            Duration::DAY.as_nanos() * INTRADAY_DAYS,
        )),
        ChartKind::Candle => {
            let width = range.width();
            if width <= 0 {
                return None;
            }
            Some(ChartRequest::anchored(
                chart_id.clone(),
                config.instrument_id.clone(),
                config.duration,
                (range.left_id - width).max(0),
                (width * 3) as u32,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{FetchIntent, Symbol};

    fn config(kind: ChartKind) -> ChartConfig {
        let mut config = ChartConfig::new(Symbol::new("SHFE", "au2006"), Duration::MINUTE);
        config.kind = kind;
        config
    }

    #[test]
    fn anchored_prefetches_one_width_left() {
        let id = ChartId::new("c");
        let config = config(ChartKind::Candle);

        let request = plan_view_request(&id, &config, ViewRange::new(100, 200)).unwrap();
        assert_eq!(
            request.intent,
            FetchIntent::Anchored {
                left_kline_id: 0,
                view_width: 300,
            }
        );

        let request = plan_view_request(&id, &config, ViewRange::new(500, 600)).unwrap();
        assert_eq!(
            request.intent,
            FetchIntent::Anchored {
                left_kline_id: 400,
                view_width: 300,
            }
        );
    }

    #[test]
    fn close_line_requests_by_trading_day() {
        let id = ChartId::new("c");
        let request = plan_view_request(&id, &config(ChartKind::Close), ViewRange::new(10, 20));

        assert_eq!(
            request.unwrap().intent,
            FetchIntent::TradingDay {
                trading_day_start: 0,
                trading_day_count: Duration::DAY.as_nanos(),
            }
        );
    }

    #[test]
    fn unresolved_range_plans_nothing() {
        let id = ChartId::new("c");
        let config = config(ChartKind::Candle);

        assert!(plan_view_request(&id, &config, ViewRange::unresolved()).is_none());
        assert!(plan_view_request(&id, &config, ViewRange::new(-1, 200)).is_none());
        assert!(plan_view_request(&id, &config, ViewRange::new(200, 200)).is_none());
    }
}
