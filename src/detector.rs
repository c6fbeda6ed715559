//! Focus change detection.

/// Compares each observed title against the previous one.
///
/// State is updated inside [`check`](ChangeDetector::check) itself, before the
/// caller does anything with the result. A change that fails downstream is
/// still consumed; the same switch is never reported twice.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last_seen: Option<String>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `current` and report whether it differs from the last title.
    ///
    /// The very first observation counts as a change.
    pub fn check(&mut self, current: &str) -> bool {
        let changed = self.last_seen.as_deref() != Some(current);
        if changed {
            self.last_seen = Some(current.to_string());
        }
        changed
    }
}
