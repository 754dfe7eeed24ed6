/// Error types for fcf.
///
/// Only three kinds of failure are ever surfaced to the user: a bad search
/// root, a delegate search tool that was found but could not be started, and
/// a navigation target that cannot be resolved to a directory. Per-entry
/// filesystem errors during a walk and a missing interactive terminal are
/// absorbed by the components that encounter them.
///
/// ```rust,ignore
/// match coordinator.execute(&request, |m| println!("[{}] {}", m.sequence, m.path.display())) {
///     Ok(outcome) => println!("{} matches", outcome.len()),
///     Err(FinderError::InvalidRoot(path)) => eprintln!("no such directory: {}", path.display()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for finder operations
pub type FinderResult<T> = Result<T, FinderError>;

/// Errors that can occur while searching or publishing a navigation target
#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Directory '{0}' does not exist or is not a directory")]
    InvalidRoot(PathBuf),
    #[error("Pattern cannot be empty")]
    EmptyPattern,
    #[error("Search backend unavailable: failed to start {program}: {source}")]
    BackendUnavailable {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("'{path}' {reason}")]
    NavigationTargetInvalid { path: PathBuf, reason: String },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Canonicalize the path and strip UNC prefixes so that
/// comparisons on Windows are consistent.
///
/// Falls back to the path unchanged when it cannot be canonicalized.
pub fn unify_path(original: &Path) -> PathBuf {
    let canonical = original
        .canonicalize()
        .unwrap_or_else(|_| original.to_path_buf());
    strip_unc_prefix(&canonical)
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}

impl FinderError {
    pub fn invalid_root(path: impl Into<PathBuf>) -> Self {
        Self::InvalidRoot(path.into())
    }

    pub fn backend_unavailable(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::BackendUnavailable {
            program: program.into(),
            source,
        }
    }

    pub fn navigation_target_invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::NavigationTargetInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<config::ConfigError> for FinderError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
