//! Search configuration, loadable from YAML files and mergeable with CLI
//! arguments.
//!
//! Configuration is looked up in three places, later sources overriding
//! earlier ones:
//! 1. Global `$CONFIG_DIR/rgrep/config.yaml`
//! 2. Local `.rgrep.yaml` in the current directory
//! 3. A custom file passed via `--config`
//!
//! Example:
//! ```yaml
//! # Search patterns, matched with the rgrep dialect
//! patterns:
//!   - "TODO"
//!   - "FIXME"
//!
//! # Root directory to search in
//! root_path: "."
//!
//! # File extensions to include
//! file_extensions:
//!   - "rs"
//!   - "toml"
//!
//! # Patterns to ignore (glob syntax)
//! ignore_patterns:
//!   - "target/**"
//!   - ".git/**"
//!
//! # Thread count (default: CPU cores)
//! thread_count: 4
//!
//! # Log level (trace, debug, info, warn, error)
//! log_level: "info"
//! ```
//!
//! CLI arguments take precedence over every file value; the merge lives in
//! [`SearchConfig::merge_with_cli`].

use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// How to treat file content that is not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Reject the file with an encoding error.
    #[default]
    FailFast,
    /// Replace invalid sequences with U+FFFD and keep searching.
    Lossy,
}

/// Configuration for a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The search patterns; a line matches when any one of them does.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Root directory to start the search from.
    pub root_path: PathBuf,

    /// Optional list of file extensions to include (e.g., ["rs", "toml"]).
    /// If None, all file extensions are included.
    #[serde(default)]
    pub file_extensions: Option<Vec<String>>,

    /// Patterns to ignore (supports glob syntax)
    /// Examples:
    /// - "target/**": Ignore everything under target/
    /// - "**/*.min.js": Ignore all minified JS files
    /// - ".git/*": Ignore direct children of .git/
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Whether to only show statistics instead of individual matches.
    #[serde(default)]
    pub stats_only: bool,

    /// Number of threads to use for searching.
    /// Defaults to number of CPU cores if not specified.
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of context lines to show before each match.
    #[serde(default)]
    pub context_before: usize,

    /// Number of context lines to show after each match.
    #[serde(default)]
    pub context_after: usize,

    /// How files that are not valid UTF-8 are handled.
    #[serde(default)]
    pub encoding_mode: EncodingMode,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl SearchConfig {
    /// Loads configuration from the default locations.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally adding a custom file with the
    /// highest precedence.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Default config locations, lowest precedence first.
        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("rgrep/config.yaml")),
            // Local config
            Some(PathBuf::from(".rgrep.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values. CLI values take
    /// precedence wherever the CLI actually set something.
    pub fn merge_with_cli(mut self, cli_config: SearchConfig) -> Self {
        if !cli_config.patterns.is_empty() {
            self.patterns = cli_config.patterns;
        }
        if cli_config.root_path != PathBuf::from(".") {
            self.root_path = cli_config.root_path;
        }
        if cli_config.file_extensions.is_some() {
            self.file_extensions = cli_config.file_extensions;
        }
        if !cli_config.ignore_patterns.is_empty() {
            self.ignore_patterns = cli_config.ignore_patterns;
        }
        if cli_config.stats_only {
            self.stats_only = true;
        }
        // Always use CLI thread count if specified
        self.thread_count = cli_config.thread_count;
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        if cli_config.context_before != 0 {
            self.context_before = cli_config.context_before;
        }
        if cli_config.context_after != 0 {
            self.context_after = cli_config.context_after;
        }
        if cli_config.encoding_mode != EncodingMode::default() {
            self.encoding_mode = cli_config.encoding_mode;
        }
        self
    }
}
