use store::Epoch;

/// Dirty-flag over a store epoch stamp.
///
/// Tracks the last epoch observed for one series handle; `has_changed`
/// reports and records a difference in a single step, so an unchanged tick
/// costs one comparison and triggers no redraw.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last_seen: Option<Epoch>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        ChangeDetector::default()
    }

    pub fn has_changed(&mut self, epoch: Epoch) -> bool {
        if self.last_seen == Some(epoch) {
            false
        } else {
            self.last_seen = Some(epoch);
            true
        }
    }

    /// Forgets the tracked stamp, e.g. when the handle is rebound to a new
    /// series after an identity change.
    pub fn reset(&mut self) {
        self.last_seen = None;
    }
}
