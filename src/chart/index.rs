use data::chart::ViewRange;
use store::KlineSeries;

/// Read-only id/datetime lookups over the displayed window of a series.
///
/// The reported right edge may run past the series frontier while the chart
/// anticipates bars that have not arrived; lookups clamp it to `last_id` so
/// they never touch unloaded ids.
pub struct KlineIndex<'a> {
    series: &'a KlineSeries,
    range: ViewRange,
}

impl<'a> KlineIndex<'a> {
    pub fn new(series: &'a KlineSeries, range: ViewRange) -> Self {
        KlineIndex { series, range }
    }

    fn effective_right(&self) -> Option<i64> {
        if self.series.get(self.range.right_id).is_some() {
            Some(self.range.right_id)
        } else {
            self.series.last_id()
        }
    }

    /// Smallest id in the window whose bar datetime is at or after `dt`.
    ///
    /// `None` when the window is unresolved, its left bar is not loaded,
    /// `dt` precedes the left bar, or `dt` lies past the effective right bar.
    pub fn id_for_datetime(&self, dt: i64) -> Option<i64> {
        if !self.range.is_resolved() {
            return None;
        }

        let left = self.range.left_id;
        let first = self.series.get(left)?;
        if dt < first.datetime {
            return None;
        }

        let right = self.effective_right()?;
        let last = self.series.get(right)?;
        if dt > last.datetime {
            return None;
        }

        self.series
            .range(left..=right)
            .find(|(_, kline)| kline.datetime >= dt)
            .map(|(id, _)| id)
    }

    /// Datetime span of the displayed window, `None` while either edge bar
    /// is unloaded.
    pub fn viewport_datetime_range(&self) -> Option<(i64, i64)> {
        if !self.range.is_resolved() {
            return None;
        }

        let left = self.series.get(self.range.left_id)?;
        let right = self.series.get(self.effective_right()?)?;
        Some((left.datetime, right.datetime))
    }
}
