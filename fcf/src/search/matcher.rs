use glob::{MatchOptions, Pattern};
use tracing::warn;

const NAME_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Matches entry base names against a shell glob (`*`, `?`, `[...]`).
///
/// A pattern that fails to compile never matches anything; a bad pattern
/// yields an empty search instead of an error.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    compiled: Option<Pattern>,
    case_insensitive: bool,
}

impl PatternMatcher {
    /// Compiles the pattern once for repeated use
    pub fn new(pattern: &str, case_insensitive: bool) -> Self {
        let source = collapse_stars(&fold(pattern, case_insensitive));
        let compiled = match Pattern::new(&source) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Invalid glob pattern '{}': {}", pattern, e);
                None
            }
        };
        Self {
            compiled,
            case_insensitive,
        }
    }

    /// False when the pattern failed to compile
    pub fn is_valid(&self) -> bool {
        self.compiled.is_some()
    }

    /// Tests a single path segment, not a full path
    pub fn is_match(&self, name: &str) -> bool {
        match &self.compiled {
            Some(pattern) => {
                pattern.matches_with(&fold(name, self.case_insensitive), NAME_MATCH_OPTIONS)
            }
            None => false,
        }
    }
}

/// One-shot form of [`PatternMatcher::is_match`]
pub fn matches(name: &str, pattern: &str, case_insensitive: bool) -> bool {
    let name = fold(name, case_insensitive);
    let pattern = collapse_stars(&fold(pattern, case_insensitive));
    Pattern::new(&pattern)
        .map(|p| p.matches_with(&name, NAME_MATCH_OPTIONS))
        .unwrap_or(false)
}

/// Reduces each run of `*` to one. Names are single path segments, so `**`
/// means the same as `*` here; glob only accepts it as a whole component.
fn collapse_stars(pattern: &str) -> String {
    let mut collapsed = String::with_capacity(pattern.len());
    let mut previous = None;
    for c in pattern.chars() {
        if c == '*' && previous == Some('*') {
            continue;
        }
        collapsed.push(c);
        previous = Some(c);
    }
    collapsed
}

fn fold(s: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        s.to_lowercase()
    } else {
        s.to_string()
    }
}
