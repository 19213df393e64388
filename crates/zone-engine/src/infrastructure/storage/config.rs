//! TOML-based configuration persistence for the engine.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\ZoneEngine\config.toml`
//! - Linux:    `~/.config/zone-engine/config.toml`
//! - macOS:    `~/Library/Application Support/ZoneEngine/config.toml`
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.  This allows
//! the engine to work correctly on first run (before a config file exists)
//! and when upgrading from an older config file that is missing newer fields.
//!
//! # Zone enum spellings
//!
//! The `[zones]` section stores the zone modes as plain strings plus their
//! numeric parameters so the file stays hand-editable.  `ZonesConfig::
//! to_zone_config` converts the flat fields into the domain [`ZoneConfig`],
//! rejecting unknown spellings with a [`ZoneParseError`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use zone_core::{CursorLockMode, OverlaySide, TilingMode, ZoneConfig, ZoneParseError};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A zone field holds an unknown spelling.
    #[error("invalid zone configuration: {0}")]
    Zone(#[from] ZoneParseError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level engine configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub zones: ZonesConfig,
}

/// General engine behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Schema version string – bump when breaking changes are introduced.
    #[serde(default = "default_version")]
    pub version: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Index into the enumerated monitor list (primary first) naming the
    /// monitor the zones apply to.  Clamped to 0 when stale.
    #[serde(default)]
    pub target_monitor: usize,
    /// Interval of the maximize/escape poll sweep, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Interval of the cursor confinement reassert loop, in milliseconds.
    #[serde(default = "default_cursor_interval_ms")]
    pub cursor_interval_ms: u64,
}

/// Zone definition settings, stored as flat hand-editable fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZonesConfig {
    /// Whether the exclusion overlay strip is active.
    #[serde(default)]
    pub overlay_enabled: bool,
    /// `"left"` or `"right"` – which side of the monitor the overlay occupies.
    #[serde(default = "default_overlay_side")]
    pub overlay_side: String,
    /// Absolute X coordinate of the overlay boundary wall.
    #[serde(default)]
    pub overlay_boundary_x: i32,

    /// Whether auto-tiling of managed windows is active.
    #[serde(default)]
    pub tiling_enabled: bool,
    /// `"full"` or `"custom"`.
    #[serde(default = "default_mode_full")]
    pub tiling_mode: String,
    /// Custom tiling horizontal bounds; ignored for `"full"`.
    #[serde(default)]
    pub tiling_start_x: i32,
    #[serde(default)]
    pub tiling_end_x: i32,

    /// Whether cursor confinement is active.
    #[serde(default)]
    pub cursor_lock_enabled: bool,
    /// `"follow_overlay"` or `"custom"`.
    #[serde(default = "default_mode_follow")]
    pub cursor_lock_mode: String,
    /// Custom cursor wall coordinate; ignored for `"follow_overlay"`.
    #[serde(default)]
    pub cursor_wall_x: i32,
}

impl ZonesConfig {
    /// Converts the flat config-file fields into the domain [`ZoneConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ZoneParseError`] when a mode or side string is not one of
    /// its known spellings.
    pub fn to_zone_config(&self) -> Result<ZoneConfig, ZoneParseError> {
        Ok(ZoneConfig {
            overlay_enabled: self.overlay_enabled,
            overlay_side: self.overlay_side.parse::<OverlaySide>()?,
            overlay_boundary_x: self.overlay_boundary_x,
            tiling_enabled: self.tiling_enabled,
            tiling_mode: TilingMode::from_parts(
                &self.tiling_mode,
                self.tiling_start_x,
                self.tiling_end_x,
            )?,
            cursor_lock_enabled: self.cursor_lock_enabled,
            cursor_lock_mode: CursorLockMode::from_parts(
                &self.cursor_lock_mode,
                self.cursor_wall_x,
            )?,
        })
    }
}

impl AppConfig {
    /// Converts the `[zones]` section into the domain [`ZoneConfig`].
    pub fn zone_config(&self) -> Result<ZoneConfig, ZoneParseError> {
        self.zones.to_zone_config()
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_version() -> String {
    "1.0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_poll_interval_ms() -> u64 {
    750
}
fn default_cursor_interval_ms() -> u64 {
    250
}
fn default_overlay_side() -> String {
    "left".to_string()
}
fn default_mode_full() -> String {
    "full".to_string()
}
fn default_mode_follow() -> String {
    "follow_overlay".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            zones: ZonesConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: default_log_level(),
            target_monitor: 0,
            poll_interval_ms: default_poll_interval_ms(),
            cursor_interval_ms: default_cursor_interval_ms(),
        }
    }
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            overlay_enabled: false,
            overlay_side: default_overlay_side(),
            overlay_boundary_x: 0,
            tiling_enabled: false,
            tiling_mode: default_mode_full(),
            tiling_start_x: 0,
            tiling_end_x: 0,
            cursor_lock_enabled: false,
            cursor_lock_mode: default_mode_follow(),
            cursor_wall_x: 0,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from disk, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk.
///
/// Creates the config directory and file if they do not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    // Ensure directory exists before writing.
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ZoneEngine"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("zone-engine"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/ZoneEngine
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ZoneEngine")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        // Fallback for unsupported platforms.
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
