use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::progress::tail::DEFAULT_TAIL_WINDOW;

/// Dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Only list users that currently have a marker
    #[serde(default)]
    pub show_running: bool,
    /// Take over the whole screen (alternate screen) instead of drawing inline
    #[serde(default = "default_clear_console")]
    pub clear_console: bool,
}

fn default_clear_console() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_running: false,
            clear_console: default_clear_console(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the launcher's `imapsync-<user>.pid` markers
    #[serde(default = "default_pid_dir")]
    pub pid_dir: PathBuf,
    /// Delay between two polls
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,
    /// Trailing bytes read from each job log per poll
    #[serde(default = "default_tail_window")]
    pub tail_window_bytes: u64,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Dashboard settings
    #[serde(default)]
    pub ui: UiConfig,
}

fn default_pid_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_refresh_interval() -> u64 {
    1000
}

fn default_tail_window() -> u64 {
    DEFAULT_TAIL_WINDOW
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pid_dir: default_pid_dir(),
            refresh_interval_ms: default_refresh_interval(),
            tail_window_bytes: default_tail_window(),
            log_level: default_log_level(),
            ui: UiConfig::default(),
        }
    }
}

/// Command line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub pid_dir: Option<PathBuf>,
    pub interval_ms: Option<u64>,
    pub show_running: bool,
    pub no_clear_console: bool,
    pub debug: bool,
}

impl Config {
    /// Load the config file; defaults when it does not exist yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load a config file. A missing file yields the defaults, an
    /// unreadable or malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))
    }

    /// ~/.config/imapsync-status/config.toml
    pub fn config_path() -> Result<PathBuf> {
        let base_dirs = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))?;
        Ok(base_dirs.home_dir().join(".config/imapsync-status/config.toml"))
    }

    /// Write the config file on first run; returns whether it was written
    pub fn save_if_missing(&self) -> Result<bool> {
        self.save_to_if_missing(&Self::config_path()?)
    }

    pub fn save_to_if_missing(&self, path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        self.save_to(path)?;
        Ok(true)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Apply command line flags on top of the file values
    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(ref dir) = cli.pid_dir {
            self.pid_dir = dir.clone();
        }
        if let Some(ms) = cli.interval_ms {
            self.refresh_interval_ms = ms;
        }
        if cli.show_running {
            self.ui.show_running = true;
        }
        if cli.no_clear_console {
            self.ui.clear_console = false;
        }
        if cli.debug {
            self.log_level = "debug".to_string();
        }
    }

    /// Poll interval, never below 50ms
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(50))
    }
}
