//! Configuration loading for claude-consolidate
//!
//! Supports TOML configuration with embedded defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// General configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Global settings file that receives the merged permissions
    pub global_settings: String,

    /// Enable the JSONL run log
    pub audit_log: bool,

    /// Path to the run log
    pub audit_path: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            global_settings: "~/.claude/settings.json".to_string(),
            audit_log: true,
            audit_path: Some("~/.claude/consolidate/audit.jsonl".to_string()),
        }
    }
}

/// Discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directory to scan when no root is given on the command line
    pub root: Option<String>,

    /// Directories deeper than this below the root are not entered
    pub max_depth: usize,

    /// Skip directories whose name starts with a dot (`.claude` excepted)
    pub skip_hidden: bool,

    /// Directory names never descended into
    pub skip_dirs: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_depth: 16,
            skip_hidden: true,
            skip_dirs: vec![
                "node_modules".to_string(),
                "target".to_string(),
                "vendor".to_string(),
                "dist".to_string(),
                "build".to_string(),
                "__pycache__".to_string(),
                "venv".to_string(),
                "Library".to_string(),
            ],
        }
    }
}

impl DiscoveryConfig {
    /// Whether a (non-`.claude`) directory name should be skipped
    pub fn skips(&self, name: &str) -> bool {
        (self.skip_hidden && name.starts_with('.')) || self.skip_dirs.iter().any(|d| d == name)
    }
}

/// Backup configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Copy the global file aside before rewriting it
    pub enabled: bool,

    /// Number of backups to retain; 0 keeps all of them
    pub keep: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keep: 10,
        }
    }
}

/// Writer configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WriterConfig {
    /// Directory for temporary files. Must be on the same filesystem as the
    /// global settings file; defaults to its directory.
    pub scratch_dir: Option<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub discovery: DiscoveryConfig,
    pub backup: BackupConfig,
    pub writer: WriterConfig,
}

impl Config {
    /// Load configuration from the standard location or use defaults
    pub fn load() -> Self {
        let Some(path) = dirs::home_dir().map(|p| p.join(".claude/consolidate/config.toml")) else {
            return Config::default();
        };

        if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load config, using defaults"
                ),
            }
        }

        Config::default()
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Expand ~ in path strings
    pub fn expand_path(path: &str) -> PathBuf {
        if path == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get the global settings path (expanded)
    pub fn global_settings_path(&self) -> PathBuf {
        Self::expand_path(&self.general.global_settings)
    }

    /// Get the discovery root (expanded), falling back to the home directory
    pub fn discovery_root(&self) -> Option<PathBuf> {
        match &self.discovery.root {
            Some(root) => Some(Self::expand_path(root)),
            None => dirs::home_dir(),
        }
    }

    /// Get the audit log path (expanded)
    pub fn audit_path(&self) -> Option<PathBuf> {
        self.general.audit_path.as_ref().map(|p| Self::expand_path(p))
    }

    /// Get the scratch directory for atomic writes (expanded)
    pub fn scratch_dir(&self) -> Option<PathBuf> {
        self.writer.scratch_dir.as_ref().map(|p| Self::expand_path(p))
    }
}

/// Embedded default configuration
pub const DEFAULT_CONFIG_TOML: &str = r#"
[general]
global_settings = "~/.claude/settings.json"
audit_log = true
audit_path = "~/.claude/consolidate/audit.jsonl"

[discovery]
max_depth = 16
skip_hidden = true
skip_dirs = ["node_modules", "target", "vendor", "dist", "build", "__pycache__", "venv", "Library"]

[backup]
enabled = true
keep = 10

[writer]
"#;
