/// Streaming name search over a directory tree.
///
/// Two interchangeable backends produce matches one at a time:
///
/// 1. **Delegate** ([`process`]): runs `fd`/`fdfind` as a child process and reads one
///    path per output line. Cancelling kills the child.
/// 2. **Walk** ([`walk`]): a sequential depth-first traversal. Cancelling simply stops
///    pulling entries.
///
/// Both implement [`MatchProducer`], so [`drive`] and the [`SearchCoordinator`] never
/// care which one is running:
///
/// ```rust,ignore
/// let coordinator = SearchCoordinator::new(&FinderConfig::default());
/// let request = SearchRequest::new("*.log", "/var/log").case_insensitive(true);
/// let outcome = coordinator.execute(&request, |m| {
///     println!("[{}] {}", m.sequence, m.path.display());
/// })?;
/// if outcome.stopped {
///     println!("stopped after {} matches", outcome.len());
/// }
/// ```
pub mod cancel;
pub mod engine;
pub mod matcher;
pub mod process;
pub mod walk;

pub use cancel::CancellationSignal;
pub use engine::{drive, MatchProducer, SearchCoordinator, Step};
pub use matcher::PatternMatcher;
pub use process::{Delegate, ProcessBackend};
pub use walk::WalkBackend;
