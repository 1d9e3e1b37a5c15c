//! Configuration system for splitwm
//!
//! Loads configuration from a TOML file, `~/.config/splitwm/config.toml` by
//! default. Auto-generates the default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub apps: AppsConfig,
    pub keybindings: KeybindingsConfig,
    pub decorations: DecorationConfig,
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location is created with defaults. A
    /// missing explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = Self::config_path()?;
                if !default_path.exists() {
                    info!("Config file not found at {:?}, using defaults", default_path);
                    Self::save_default(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {:?}", config_path))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {:?}", config_path))?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("splitwm");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Log sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// File the log lines are appended to
    pub path: PathBuf,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/tmp/splitwm.log"),
            filter: "splitwm=debug,info".to_string(),
        }
    }
}

/// External programs started from key bindings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppsConfig {
    pub terminal: String,
    pub launcher: String,
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self {
            terminal: "alacritty".to_string(),
            launcher: "dmenu_run".to_string(),
        }
    }
}

/// Keyboard shortcuts configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    /// Modifier that must be held: "Super", "Alt", "Control" or "Shift"
    pub modifier: String,
    pub close_manager: String,
    pub close_window: String,
    pub open_terminal: String,
    pub open_launcher: String,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            modifier: "Super".to_string(),
            close_manager: "F4".to_string(),
            close_window: "q".to_string(),
            open_terminal: "Return".to_string(),
            open_launcher: "d".to_string(),
        }
    }
}

/// Window decoration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    /// Frame border width in pixels
    pub border_width: u16,
    /// Border color of the focused window (hex: 0xRRGGBB)
    pub active_border: u32,
    /// Border color of every other window (hex: 0xRRGGBB)
    pub inactive_border: u32,
    /// Frame background color (hex: 0xRRGGBB)
    pub background: u32,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            border_width: 2,
            active_border: 0x00ff00,   // Bright green
            inactive_border: 0x222222, // Dark gray
            background: 0xffffff,
        }
    }
}
