pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod navigation;
pub mod results;
pub mod search;
pub mod terminal;

pub use config::{CliOverrides, FinderConfig, SearchRequest};
pub use errors::{FinderError, FinderResult};
pub use filters::EntryTypeFilter;
pub use navigation::{InvokingUser, NavigationHandoff};
pub use results::{BackendKind, MatchRecord, SearchOutcome};
pub use search::{CancellationSignal, SearchCoordinator};
