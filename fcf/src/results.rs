use std::fmt;
use std::path::PathBuf;

/// Which backend produced a search outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// The external delegate search tool (`fd`/`fdfind`)
    Delegate,
    /// The built-in sequential directory walk
    Walk,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Delegate => write!(f, "delegate"),
            BackendKind::Walk => write!(f, "walk"),
        }
    }
}

/// A single matched entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// The path as reported by the backend
    pub path: PathBuf,
    /// 1-based discovery order, used for display numbering only
    pub sequence: usize,
}

/// The complete result of one search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Matches in discovery order
    pub matches: Vec<MatchRecord>,
    /// True iff cancellation fired before the backend finished
    pub stopped: bool,
    /// The backend that ran
    pub backend: BackendKind,
}

impl SearchOutcome {
    /// Creates an empty outcome for the given backend
    pub fn new(backend: BackendKind) -> Self {
        Self {
            matches: Vec::new(),
            stopped: false,
            backend,
        }
    }

    /// Appends a match, assigning it the next sequence number
    pub fn push(&mut self, path: PathBuf) -> &MatchRecord {
        let sequence = self.matches.len() + 1;
        self.matches.push(MatchRecord { path, sequence });
        // just pushed
        &self.matches[sequence - 1]
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Looks up a match by its 1-based sequence number
    pub fn get(&self, sequence: usize) -> Option<&MatchRecord> {
        sequence
            .checked_sub(1)
            .and_then(|index| self.matches.get(index))
    }

    /// Iterates over the matched paths in discovery order
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.matches.iter().map(|m| &m.path)
    }
}
