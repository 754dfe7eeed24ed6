use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Counters for a single search run
#[derive(Debug, Clone, Default)]
pub struct SearchMetrics {
    // Walk backend
    entries_visited: Arc<AtomicU64>,
    entries_skipped: Arc<AtomicU64>,

    // Delegate backend
    lines_read: Arc<AtomicU64>,
    lossy_lines: Arc<AtomicU64>,

    matches_found: Arc<AtomicU64>,
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a directory entry examined by the walk
    pub fn record_entry(&self) {
        self.entries_visited.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an entry that could not be read and was skipped
    pub fn record_skipped(&self) {
        self.entries_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a line read from the delegate's output
    pub fn record_line(&self, lossy: bool) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        if lossy {
            self.lossy_lines.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_match(&self) {
        self.matches_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entries_visited(&self) -> u64 {
        self.entries_visited.load(Ordering::Relaxed)
    }

    pub fn entries_skipped(&self) -> u64 {
        self.entries_skipped.load(Ordering::Relaxed)
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read.load(Ordering::Relaxed)
    }

    pub fn lossy_lines(&self) -> u64 {
        self.lossy_lines.load(Ordering::Relaxed)
    }

    pub fn matches_found(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }

    /// Logs the current counters
    pub fn log_stats(&self) {
        debug!(
            "Search metrics: {} entries visited, {} skipped, {} delegate lines ({} lossy), {} matches",
            self.entries_visited(),
            self.entries_skipped(),
            self.lines_read(),
            self.lossy_lines(),
            self.matches_found()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = SearchMetrics::new();
        metrics.record_entry();
        metrics.record_entry();
        metrics.record_skipped();
        metrics.record_line(false);
        metrics.record_line(true);
        metrics.record_match();

        assert_eq!(metrics.entries_visited(), 2);
        assert_eq!(metrics.entries_skipped(), 1);
        assert_eq!(metrics.lines_read(), 2);
        assert_eq!(metrics.lossy_lines(), 1);
        assert_eq!(metrics.matches_found(), 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = SearchMetrics::new();
        let clone = metrics.clone();
        clone.record_match();
        assert_eq!(metrics.matches_found(), 1);
    }
}
