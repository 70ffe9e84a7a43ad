use crate::config::Theme;

use serde::{Deserialize, Serialize};
use store::{Duration, Symbol};

/// Main plot of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ChartKind {
    /// OHLC candles over bar ids.
    #[default]
    Candle,
    /// Rolling close-price line over the current trading day window.
    Close,
}

impl ChartKind {
    pub const ALL: [ChartKind; 2] = [ChartKind::Candle, ChartKind::Close];
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Candle => write!(f, "Candles"),
            ChartKind::Close => write!(f, "Close line"),
        }
    }
}

/// Displayed id window as reported by the rendering surface.
///
/// The surface reports `-1` for an edge it has not resolved yet; nothing may
/// be requested or recomputed from a range until both edges are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewRange {
    pub left_id: i64,
    pub right_id: i64,
}

impl ViewRange {
    pub const UNSET: i64 = -1;

    pub fn new(left_id: i64, right_id: i64) -> Self {
        ViewRange { left_id, right_id }
    }

    pub fn unresolved() -> Self {
        ViewRange {
            left_id: Self::UNSET,
            right_id: Self::UNSET,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.left_id >= 0 && self.right_id >= 0
    }

    /// Span in bars, right edge minus left edge.
    pub fn width(&self) -> i64 {
        self.right_id - self.left_id
    }
}

impl Default for ViewRange {
    fn default() -> Self {
        ViewRange::unresolved()
    }
}

/// Reactive configuration surface of one mounted chart.
///
/// Instrument, duration and kind form the chart's identity: changing any of
/// them rebuilds overlays and the main series subscription from scratch,
/// while width/height/theme changes pass through to the surface untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChartConfig {
    pub instrument_id: Symbol,
    pub duration: Duration,
    pub width: u32,
    pub height: u32,
    pub theme: Theme,
    pub kind: ChartKind,
}

impl ChartConfig {
    pub fn new(instrument_id: Symbol, duration: Duration) -> Self {
        ChartConfig {
            instrument_id,
            duration,
            width: 800,
            height: 600,
            theme: Theme::default(),
            kind: ChartKind::default(),
        }
    }

    pub fn same_identity(&self, other: &ChartConfig) -> bool {
        self.instrument_id == other.instrument_id
            && self.duration == other.duration
            && self.kind == other.kind
    }
}
