use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{FinderError, FinderResult};
use crate::filters::EntryTypeFilter;

/// Persistent defaults for fcf.
///
/// # Configuration Locations
///
/// Loaded from, in order of increasing precedence:
/// 1. Global `$CONFIG_DIR/fcf/config.yaml`
/// 2. Local `.fcf.yaml` in the current directory
/// 3. Custom config file specified via `--config`
///
/// Explicit command-line flags override all of them, see [`FinderConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Fold case when matching names
/// case_insensitive: false
///
/// # any | file | dir
/// entry_type: any
///
/// # Maximum results printed live (0 = unlimited)
/// max_display: 0
///
/// # Show file sizes next to results
/// show_size: false
///
/// # Use fd/fdfind when it is installed
/// use_delegate: true
///
/// # How often the stop key is polled during a search
/// poll_interval_ms: 50
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Fold case when matching names
    #[serde(default)]
    pub case_insensitive: bool,

    /// Which kinds of entries to report
    #[serde(default)]
    pub entry_type: EntryTypeFilter,

    /// Live display cap; 0 prints every match
    #[serde(default)]
    pub max_display: usize,

    /// Show file sizes next to results
    #[serde(default)]
    pub show_size: bool,

    /// Prefer the delegate search tool when it is installed
    #[serde(default = "default_use_delegate")]
    pub use_delegate: bool,

    /// Sleep between stop-key polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_use_delegate() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            entry_type: EntryTypeFilter::Any,
            max_display: 0,
            show_size: false,
            use_delegate: default_use_delegate(),
            poll_interval_ms: default_poll_interval_ms(),
            log_level: default_log_level(),
        }
    }
}

/// Command-line overrides; `None` leaves the configured value alone
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub case_insensitive: bool,
    pub entry_type: Option<EntryTypeFilter>,
    pub max_display: Option<usize>,
    pub show_size: bool,
    pub no_delegate: bool,
    pub log_level: Option<String>,
}

impl FinderConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("fcf/config.yaml")),
            Some(PathBuf::from(".fcf.yaml")),
        ];
        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if cli.case_insensitive {
            self.case_insensitive = true;
        }
        if let Some(entry_type) = cli.entry_type {
            self.entry_type = entry_type;
        }
        if let Some(max_display) = cli.max_display {
            self.max_display = max_display;
        }
        if cli.show_size {
            self.show_size = true;
        }
        if cli.no_delegate {
            self.use_delegate = false;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Builds a search request for this configuration
    pub fn request(&self, pattern: impl Into<String>, root: impl Into<PathBuf>) -> SearchRequest {
        SearchRequest {
            pattern: pattern.into(),
            root_path: root.into(),
            case_insensitive: self.case_insensitive,
            entry_type: self.entry_type,
            max_display: self.max_display,
        }
    }
}

/// Everything one search needs; built once and passed by reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Glob matched against each entry's base name
    pub pattern: String,
    /// Directory to search under
    pub root_path: PathBuf,
    pub case_insensitive: bool,
    pub entry_type: EntryTypeFilter,
    /// Live display cap; 0 prints every match
    pub max_display: usize,
}

impl SearchRequest {
    pub fn new(pattern: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        FinderConfig::default().request(pattern, root)
    }

    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    pub fn entry_type(mut self, entry_type: EntryTypeFilter) -> Self {
        self.entry_type = entry_type;
        self
    }

    pub fn max_display(mut self, max_display: usize) -> Self {
        self.max_display = max_display;
        self
    }

    /// Whether the match with this sequence number should be printed live
    pub fn should_display(&self, sequence: usize) -> bool {
        self.max_display == 0 || sequence <= self.max_display
    }

    pub fn validate(&self) -> FinderResult<()> {
        if self.pattern.is_empty() {
            return Err(FinderError::EmptyPattern);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            case_insensitive: true
            entry_type: dir
            max_display: 25
            show_size: true
            use_delegate: false
            poll_interval_ms: 20
            log_level: "debug"
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = FinderConfig::load_from(Some(&config_path)).unwrap();
        assert!(config.case_insensitive);
        assert_eq!(config.entry_type, EntryTypeFilter::DirOnly);
        assert_eq!(config.max_display, 25);
        assert!(config.show_size);
        assert!(!config.use_delegate);
        assert_eq!(config.poll_interval(), Duration::from_millis(20));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_default_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "show_size: false\n").unwrap();

        let config = FinderConfig::load_from(Some(&config_path)).unwrap();
        assert!(!config.case_insensitive);
        assert_eq!(config.entry_type, EntryTypeFilter::Any);
        assert_eq!(config.max_display, 0);
        assert!(config.use_delegate);
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            "entry_type: sideways\nmax_display: \"lots\"\n",
        )
        .unwrap();

        assert!(FinderConfig::load_from(Some(&config_path)).is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = FinderConfig::load_from(Some(Path::new("nonexistent.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_with_cli() {
        let file_config = FinderConfig {
            max_display: 10,
            show_size: true,
            ..FinderConfig::default()
        };

        let merged = file_config.clone().merge_with_cli(CliOverrides {
            case_insensitive: true,
            entry_type: Some(EntryTypeFilter::FileOnly),
            max_display: None,
            show_size: false,
            no_delegate: true,
            log_level: Some("debug".to_string()),
        });
        assert!(merged.case_insensitive); // CLI value
        assert_eq!(merged.entry_type, EntryTypeFilter::FileOnly); // CLI value
        assert_eq!(merged.max_display, 10); // File value (CLI None)
        assert!(merged.show_size); // File value
        assert!(!merged.use_delegate); // CLI value
        assert_eq!(merged.log_level, "debug"); // CLI value

        let untouched = file_config.clone().merge_with_cli(CliOverrides::default());
        assert_eq!(untouched, file_config);
    }

    #[test]
    fn test_request_from_config() {
        let config = FinderConfig {
            case_insensitive: true,
            entry_type: EntryTypeFilter::DirOnly,
            max_display: 3,
            ..FinderConfig::default()
        };
        let request = config.request("src", ".");
        assert_eq!(request.pattern, "src");
        assert_eq!(request.root_path, PathBuf::from("."));
        assert!(request.case_insensitive);
        assert_eq!(request.entry_type, EntryTypeFilter::DirOnly);
        assert_eq!(request.max_display, 3);
    }

    #[test]
    fn test_should_display() {
        let unlimited = SearchRequest::new("*", ".");
        assert!(unlimited.should_display(1));
        assert!(unlimited.should_display(10_000));

        let capped = SearchRequest::new("*", ".").max_display(2);
        assert!(capped.should_display(1));
        assert!(capped.should_display(2));
        assert!(!capped.should_display(3));
    }

    #[test]
    fn test_validate_rejects_empty_pattern() {
        assert!(matches!(
            SearchRequest::new("", ".").validate(),
            Err(FinderError::EmptyPattern)
        ));
        assert!(SearchRequest::new("*.rs", ".").validate().is_ok());
    }
}
