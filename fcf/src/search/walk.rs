use ignore::{Walk, WalkBuilder};
use std::path::PathBuf;
use tracing::debug;

use super::cancel::CancellationSignal;
use super::engine::{drive, MatchProducer, Step};
use super::matcher::PatternMatcher;
use crate::config::SearchRequest;
use crate::errors::FinderResult;
use crate::filters::EntryTypeFilter;
use crate::metrics::SearchMetrics;
use crate::results::{BackendKind, MatchRecord, SearchOutcome};

/// Built-in sequential directory traversal, used when no delegate is installed
#[derive(Debug, Clone, Default)]
pub struct WalkBackend {
    metrics: SearchMetrics,
}

impl WalkBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: SearchMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    /// Prepares a traversal of `request.root_path` without visiting anything yet
    pub fn producer(&self, request: &SearchRequest) -> WalkProducer {
        let mut builder = WalkBuilder::new(&request.root_path);
        // Search everything: no hidden-file or ignore-file skipping.
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        WalkProducer {
            walker: builder.build(),
            matcher: PatternMatcher::new(&request.pattern, request.case_insensitive),
            entry_type: request.entry_type,
            metrics: self.metrics.clone(),
        }
    }

    /// Walks the tree, calling `on_match` for every match inside the display cap
    pub fn run<F>(
        &self,
        request: &SearchRequest,
        on_match: F,
        cancel: &CancellationSignal,
    ) -> FinderResult<SearchOutcome>
    where
        F: FnMut(&MatchRecord),
    {
        let mut producer = self.producer(request);
        drive(&mut producer, request, cancel, on_match)
    }
}

/// Depth-first walk that yields one match at a time
pub struct WalkProducer {
    walker: Walk,
    matcher: PatternMatcher,
    entry_type: EntryTypeFilter,
    metrics: SearchMetrics,
}

impl MatchProducer for WalkProducer {
    fn kind(&self) -> BackendKind {
        BackendKind::Walk
    }

    fn next_match(&mut self, cancel: &CancellationSignal) -> FinderResult<Step> {
        loop {
            if cancel.is_tripped() {
                return Ok(Step::Cancelled);
            }

            let entry = match self.walker.next() {
                None => return Ok(Step::Done),
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    debug!("Skipping unreadable entry: {}", e);
                    self.metrics.record_skipped();
                    continue;
                }
            };

            // The root itself is never a result
            if entry.depth() == 0 {
                continue;
            }
            self.metrics.record_entry();

            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            if !self.entry_type.admits(is_dir) {
                continue;
            }

            if self.matcher.is_match(&entry.file_name().to_string_lossy()) {
                self.metrics.record_match();
                let path: PathBuf = entry.into_path();
                return Ok(Step::Match(path));
            }
        }
    }
}
