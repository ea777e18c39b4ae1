//! File filtering configuration.
//!
//! Filters decide which enumerated files are handed to the planner. The
//! built-in default lets every file through. Supported rules:
//! - Exact filename matching
//! - Glob patterns against the path relative to the source directory
//! - File extension matching
//! - Regex patterns against the file name
//! - Include (whitelist) patterns that override every exclude rule
//!
//! # Configuration File Format
//!
//! ```toml
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["bak", "tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".typesortrc.toml";

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration in {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
}

/// Root of the TOML configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub filters: FilterRules,

    /// File this configuration was read from. It is never organized itself.
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether files whose name starts with "." are organized. Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, checked before everything else.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns (e.g., "*.tmp", "node_modules/**").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, matched case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FilterConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided (must exist)
    /// 2. `.typesortrc.toml` in the current directory
    /// 3. `~/.config/typesort/config.toml`
    /// 4. the built-in default
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("typesort").join("config.toml");
            if home_config.is_file() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.loaded_from = Some(anchor_path(path));
        tracing::debug!(path = %path.display(), "loaded filter configuration");
        Ok(config)
    }

    /// Compile configuration into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(self) -> Result<CompiledFilters, ConfigError> {
        let mut compiled = CompiledFilters::new(self.filters)?;
        compiled.config_file = self.loaded_from;
        Ok(compiled)
    }
}

/// Canonical parent joined with the file's own name. A symlinked config
/// file is not followed to its target.
fn anchor_path(path: &Path) -> PathBuf {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    fs::canonicalize(parent)
        .map(|dir| dir.join(name))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Pre-parsed filter rules.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
    config_file: Option<PathBuf>,
}

impl Default for CompiledFilters {
    /// Filters that let every file through.
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
            config_file: None,
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
            config_file: None,
        })
    }

    /// Check whether a file should be organized.
    ///
    /// `relative_path` is the file's path relative to the source directory.
    /// Checks run in this order, first decisive match wins:
    /// 1. Include patterns: include
    /// 2. Hidden file while hidden files are disabled: exclude
    /// 3. Exact filename: exclude
    /// 4. Extension: exclude
    /// 5. Glob pattern: exclude
    /// 6. Regex: exclude
    /// 7. Otherwise include
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.matches_any(&self.include_patterns, relative_path) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.matches_any(&self.exclude_patterns, relative_path) {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }

    /// True if `path` is the configuration file these filters came from.
    pub fn is_config_file(&self, path: &Path) -> bool {
        self.config_file.as_deref() == Some(path)
    }

    fn matches_any(&self, patterns: &[Pattern], path: &Path) -> bool {
        patterns.iter().any(|pattern| pattern.matches_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn compiled(exclude: ExcludeRules, include: IncludeRules) -> CompiledFilters {
        FilterConfig {
            filters: FilterRules {
                enable_hidden_files: true,
                exclude,
                include,
            },
            ..Default::default()
        }
        .compile()
        .unwrap()
    }

    #[test]
    fn test_default_config_includes_everything() {
        let compiled = FilterConfig::default().compile().unwrap();

        assert!(compiled.should_include(Path::new(".bashrc")));
        assert!(compiled.should_include(Path::new("deep/nested/file.tar.gz")));
        assert!(compiled.should_include(Path::new("Makefile")));
    }

    #[test]
    fn test_hidden_files_excluded_when_disabled() {
        let config = FilterConfig {
            filters: FilterRules {
                enable_hidden_files: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let compiled = config.compile().unwrap();

        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(compiled.should_include(Path::new("visible.txt")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = compiled(
            ExcludeRules {
                filenames: vec!["Thumbs.db".to_string()],
                ..Default::default()
            },
            IncludeRules::default(),
        );

        assert!(!compiled.should_include(Path::new("Thumbs.db")));
        assert!(!compiled.should_include(Path::new("sub/Thumbs.db")));
        assert!(compiled.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let compiled = compiled(
            ExcludeRules {
                extensions: vec!["bak".to_string(), ".TMP".to_string()],
                ..Default::default()
            },
            IncludeRules::default(),
        );

        assert!(!compiled.should_include(Path::new("file.bak")));
        assert!(!compiled.should_include(Path::new("file.BAK")));
        assert!(!compiled.should_include(Path::new("file.tmp")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_on_relative_path() {
        let compiled = compiled(
            ExcludeRules {
                patterns: vec!["*.cache".to_string(), "node_modules/**".to_string()],
                ..Default::default()
            },
            IncludeRules::default(),
        );

        assert!(!compiled.should_include(Path::new("file.cache")));
        assert!(!compiled.should_include(Path::new("node_modules/pkg/index.js")));
        assert!(compiled.should_include(Path::new("src/index.js")));
    }

    #[test]
    fn test_exclude_regex_on_file_name() {
        let compiled = compiled(
            ExcludeRules {
                regex: vec![r"^~\$".to_string()],
                ..Default::default()
            },
            IncludeRules::default(),
        );

        assert!(!compiled.should_include(Path::new("~$report.docx")));
        assert!(compiled.should_include(Path::new("report.docx")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let compiled = compiled(
            ExcludeRules {
                extensions: vec!["log".to_string()],
                ..Default::default()
            },
            IncludeRules {
                patterns: vec!["keep.log".to_string()],
            },
        );

        assert!(compiled.should_include(Path::new("keep.log")));
        assert!(!compiled.should_include(Path::new("other.log")));
    }

    #[test]
    fn test_invalid_patterns_return_errors() {
        let bad_regex = FilterConfig {
            filters: FilterRules {
                exclude: ExcludeRules {
                    regex: vec!["[invalid(".to_string()],
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            bad_regex.compile(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));

        let bad_glob = FilterConfig {
            filters: FilterRules {
                exclude: ExcludeRules {
                    patterns: vec!["[invalid".to_string()],
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            bad_glob.compile(),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[filters]\nenable_hidden_files = false\n\n[filters.exclude]\nextensions = [\"iso\"]\n",
        )
        .unwrap();

        let config = FilterConfig::load(Some(&path)).unwrap();
        assert!(!config.filters.enable_hidden_files);
        assert_eq!(config.filters.exclude.extensions, vec!["iso".to_string()]);
        assert!(config.filters.include.patterns.is_empty());
    }

    #[test]
    fn test_loaded_file_is_recognized_as_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(&path, "[filters.exclude]\nextensions = [\"log\"]\n").unwrap();
        let canonical_dir = fs::canonicalize(dir.path()).unwrap();

        let compiled = FilterConfig::load(Some(&path)).unwrap().compile().unwrap();
        assert!(compiled.is_config_file(&canonical_dir.join(LOCAL_CONFIG_FILE)));
        assert!(!compiled.is_config_file(&canonical_dir.join("other.toml")));

        let defaults = FilterConfig::default().compile().unwrap();
        assert!(!defaults.is_config_file(&canonical_dir.join(LOCAL_CONFIG_FILE)));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.toml");
        fs::write(&path, "").unwrap();

        let config = FilterConfig::load(Some(&path)).unwrap();
        assert!(config.filters.enable_hidden_files);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");

        assert!(matches!(
            FilterConfig::load(Some(&missing)),
            Err(ConfigError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[filters\nbroken").unwrap();

        assert!(matches!(
            FilterConfig::load(Some(&path)),
            Err(ConfigError::ConfigInvalid { .. })
        ));
    }
}
