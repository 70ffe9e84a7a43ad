pub mod chart;
pub mod surface;

pub use chart::epoch::ChangeDetector;
pub use chart::focus::FocusPositioner;
pub use chart::index::KlineIndex;
pub use chart::overlay::{OverlaySync, TradeMatching};
pub use chart::{ChartSession, Requests, SessionConfig, SessionMode};
pub use surface::{HeadlessSurface, Mark, MarkSide, Surface};
