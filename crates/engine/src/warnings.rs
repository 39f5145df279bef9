//! Rate-limited warnings
//!
//! Some inconsistencies can occur once per vector, which on a large
//! experiment would flood the log. A [`WarningLimiter`] lets the first
//! `limit` occurrences through in detail and counts the rest, which are
//! reported in one summary line by [`WarningLimiter::finish`].

use tracing::warn;

/// Counts occurrences of one kind of warning and logs only the first few
#[derive(Debug)]
pub struct WarningLimiter {
    what: &'static str,
    limit: usize,
    occurrences: usize,
}

impl WarningLimiter {
    /// Limiter for warnings described as `what` (used in the summary)
    pub fn new(what: &'static str, limit: usize) -> Self {
        Self {
            what,
            limit,
            occurrences: 0,
        }
    }

    /// Record one occurrence; `log` runs only while under the limit
    pub fn report(&mut self, log: impl FnOnce()) {
        if self.occurrences < self.limit {
            log();
        }
        self.occurrences += 1;
    }

    /// Total occurrences so far
    pub fn occurrences(&self) -> usize {
        self.occurrences
    }

    /// Occurrences that were counted but not logged
    pub fn suppressed(&self) -> usize {
        self.occurrences.saturating_sub(self.limit)
    }

    /// Log a summary of the suppressed occurrences, if any
    pub fn finish(&self) {
        let suppressed = self.suppressed();
        if suppressed > 0 {
            warn!(
                total = self.occurrences,
                suppressed,
                "{} further {} not logged individually",
                suppressed,
                self.what
            );
        }
    }
}
