use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::cancel::CancellationSignal;
use super::process::{Delegate, ProcessBackend};
use super::walk::WalkBackend;
use crate::config::{FinderConfig, SearchRequest};
use crate::errors::{unify_path, FinderError, FinderResult};
use crate::metrics::SearchMetrics;
use crate::results::{BackendKind, MatchRecord, SearchOutcome};
use crate::terminal::{platform_terminal, CancellationListener, TerminalController};

/// One step of a cancellable search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The next match in discovery order
    Match(PathBuf),
    /// The signal tripped; the backend has already stopped
    Cancelled,
    /// The backend ran to completion
    Done,
}

/// A backend's search, driven one match at a time.
///
/// Implementations check the signal before every unit of work and clean up
/// their own resources when they return `Step::Cancelled`.
pub trait MatchProducer {
    fn kind(&self) -> BackendKind;

    fn next_match(&mut self, cancel: &CancellationSignal) -> FinderResult<Step>;
}

/// Collects every match from `producer`, streaming those inside the display cap
pub fn drive<P, F>(
    producer: &mut P,
    request: &SearchRequest,
    cancel: &CancellationSignal,
    mut on_match: F,
) -> FinderResult<SearchOutcome>
where
    P: MatchProducer + ?Sized,
    F: FnMut(&MatchRecord),
{
    let mut outcome = SearchOutcome::new(producer.kind());
    loop {
        match producer.next_match(cancel)? {
            Step::Match(path) => {
                let record = outcome.push(path);
                if request.should_display(record.sequence) {
                    on_match(record);
                }
            }
            Step::Cancelled => {
                outcome.stopped = true;
                break;
            }
            Step::Done => break,
        }
    }
    Ok(outcome)
}

/// Picks a backend, runs it with stop-key support and returns the outcome
pub struct SearchCoordinator {
    delegate: Option<Delegate>,
    terminal: Arc<dyn TerminalController>,
    poll_interval: Duration,
}

impl SearchCoordinator {
    /// Coordinator for this process: discovered delegate, platform terminal
    pub fn new(config: &FinderConfig) -> Self {
        let delegate = if config.use_delegate {
            Delegate::discover()
        } else {
            None
        };
        Self {
            delegate,
            terminal: platform_terminal(),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn with_delegate(mut self, delegate: Option<Delegate>) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn with_terminal(mut self, terminal: Arc<dyn TerminalController>) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The backend `execute` will use
    pub fn backend(&self) -> BackendKind {
        if self.delegate.is_some() {
            BackendKind::Delegate
        } else {
            BackendKind::Walk
        }
    }

    pub fn delegate(&self) -> Option<&Delegate> {
        self.delegate.as_ref()
    }

    /// Resolves the root, validates it and runs the selected backend.
    ///
    /// `on_match` is called for each match within `request.max_display`.
    /// The terminal is restored before this returns, on every path.
    pub fn execute<F>(&self, request: &SearchRequest, on_match: F) -> FinderResult<SearchOutcome>
    where
        F: FnMut(&MatchRecord),
    {
        request.validate()?;

        let resolved = SearchRequest {
            root_path: unify_path(&request.root_path),
            ..request.clone()
        };
        if !resolved.root_path.is_dir() {
            return Err(FinderError::invalid_root(&request.root_path));
        }

        info!(
            "Searching {} for '{}' using {} backend",
            resolved.root_path.display(),
            resolved.pattern,
            self.backend()
        );

        let metrics = SearchMetrics::new();
        let listener = CancellationListener::start(Arc::clone(&self.terminal), self.poll_interval);
        let cancel = listener.signal();

        let result = match &self.delegate {
            Some(delegate) => {
                let backend = ProcessBackend::with_metrics(delegate.clone(), metrics.clone());
                backend.run(&resolved, on_match, &cancel)
            }
            None => WalkBackend::with_metrics(metrics.clone()).run(&resolved, on_match, &cancel),
        };
        drop(listener);

        let outcome = result?;
        metrics.log_stats();
        if outcome.stopped {
            debug!("Search stopped by user after {} matches", outcome.len());
        }
        info!("Search complete. Found {} matches", outcome.len());
        Ok(outcome)
    }
}
