pub mod chart;
pub mod config;
pub mod util;

pub use chart::{ChartConfig, ChartKind, ViewRange};
pub use config::Theme;
