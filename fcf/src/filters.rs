use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::FinderError;

/// Restricts which kinds of entries a search reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTypeFilter {
    /// Files, directories and everything else
    #[default]
    Any,
    /// Everything that is not a directory
    #[serde(alias = "f", alias = "file")]
    FileOnly,
    /// Directories only
    #[serde(alias = "d", alias = "dir")]
    DirOnly,
}

impl EntryTypeFilter {
    /// Checks whether an entry of the given kind passes the filter
    pub fn admits(self, is_dir: bool) -> bool {
        match self {
            EntryTypeFilter::Any => true,
            EntryTypeFilter::FileOnly => !is_dir,
            EntryTypeFilter::DirOnly => is_dir,
        }
    }

    /// The delegate's `--type` value for this filter, if any
    pub fn delegate_type(self) -> Option<&'static str> {
        match self {
            EntryTypeFilter::Any => None,
            EntryTypeFilter::FileOnly => Some("f"),
            EntryTypeFilter::DirOnly => Some("d"),
        }
    }
}

impl FromStr for EntryTypeFilter {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "any" => Ok(EntryTypeFilter::Any),
            "f" | "file" | "fileonly" => Ok(EntryTypeFilter::FileOnly),
            "d" | "dir" | "directory" | "dironly" => Ok(EntryTypeFilter::DirOnly),
            other => Err(FinderError::config_error(format!(
                "Invalid type '{}': use 'f' for files or 'd' for directories",
                other
            ))),
        }
    }
}

impl fmt::Display for EntryTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryTypeFilter::Any => write!(f, "any"),
            EntryTypeFilter::FileOnly => write!(f, "files"),
            EntryTypeFilter::DirOnly => write!(f, "directories"),
        }
    }
}
