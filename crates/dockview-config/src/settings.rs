//! Dashboard configuration
//!
//! Located at `~/.config/dockview/config.toml`

use crate::{ConfigError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level dockview configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Write logs to this file instead of discarding them while the dashboard runs
    pub log_file: Option<PathBuf>,
    pub runtime: RuntimeConfig,
    pub refresh: RefreshConfig,
    pub actions: ActionsConfig,
    pub keys: KeysConfig,
    pub logs: LogsConfig,
    pub ui: UiConfig,
}

/// Which container runtime CLI to drive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Runtime executable ("docker" or "podman")
    pub program: String,
    /// Optional command prefix (e.g. ["flatpak-spawn", "--host"] inside a toolbox)
    pub prefix: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
            prefix: Vec::new(),
        }
    }
}

/// Background polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between polls
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Mutating commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Maximum number of runtime commands in flight during a project-wide action
    pub batch_concurrency: usize,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: 4,
        }
    }
}

/// Key input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// How long a two-key sequence prefix (e.g. the first `g` of `gg`) stays pending
    pub sequence_timeout_ms: u64,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            sequence_timeout_ms: 500,
        }
    }
}

impl KeysConfig {
    pub fn sequence_timeout(&self) -> Duration {
        Duration::from_millis(self.sequence_timeout_ms)
    }
}

/// How live logs are opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LauncherKind {
    /// iTerm2 on macOS, the configured terminal command elsewhere
    #[default]
    Auto,
    /// New iTerm2 tab via osascript
    Iterm,
    /// Spawn `terminal_command` with the log pipeline appended
    Terminal,
    /// Log viewing disabled
    None,
}

/// Live log viewing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Number of historical lines to show before following
    pub tail: u64,
    /// Filter the raw log stream is piped through
    pub formatter: String,
    pub launcher: LauncherKind,
    /// Terminal emulator invocation; the log pipeline is passed as the final argument
    pub terminal_command: Vec<String>,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            tail: 200,
            formatter: "dockview-fmt".to_string(),
            launcher: LauncherKind::Auto,
            terminal_command: Vec::new(),
        }
    }
}

/// Initial display options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Include stopped containers in the list
    pub show_stopped: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { show_stopped: true }
    }
}

impl DashboardConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;

        tracing::debug!(
            "Loaded config from {:?}: runtime={}, interval={}s",
            path,
            config.runtime.program,
            config.refresh.interval_secs
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reject values the dashboard cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.runtime.program.trim().is_empty() {
            return Err(ConfigError::Invalid("runtime.program must not be empty".into()));
        }
        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh.interval_secs must be at least 1".into(),
            ));
        }
        if self.actions.batch_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "actions.batch_concurrency must be at least 1".into(),
            ));
        }
        if self.logs.launcher == LauncherKind::Terminal && self.logs.terminal_command.is_empty() {
            return Err(ConfigError::Invalid(
                "logs.launcher = \"terminal\" requires logs.terminal_command".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "dockview").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}
