//! The main config loading module for presto.
//!
//! Handles loading and deserializing settings from `presto.toml`.
//!
//! Provides and manages the main [Settings] struct, as well as the internal
//! [RawSettings] used for parsing and processing.
//!
//! Settings are an explicit value handed to the aggregator and router at
//! construction. Nothing in presto reads configuration through a process-wide
//! singleton; a hot reload is a fresh [Settings::load] call and a rebuild of
//! whatever consumed the old value.

use crate::utils::{DEFAULT_EXPLORER_ITEMS, clamp_explorer_items, get_home};

use serde::Deserialize;
use std::time::Duration;
use std::{fs, io, path::PathBuf};

/// How a link-mode activation behaves while a load pass is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnBusyActivation {
    /// Wait up to the given duration for the pass, then cancel it and decline.
    WaitBounded(Duration),
    /// Cancel the in-flight pass immediately and decline the activation.
    CancelAndDismiss,
}

impl Default for OnBusyActivation {
    fn default() -> Self {
        OnBusyActivation::WaitBounded(Duration::from_secs(10))
    }
}

/// Raw configuration as read from the toml file.
/// This struct is deserialized directly from the toml file.
/// It uses owned types and is then converted into the main [Settings] struct.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub(crate) struct RawSettings {
    sources: RawSources,
    explorer: RawExplorer,
    activation: RawActivation,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct RawSources {
    shortcut_roots: Vec<String>,
    lists_dir: Option<String>,
}

impl Default for RawSources {
    fn default() -> Self {
        RawSources {
            shortcut_roots: Vec::new(),
            lists_dir: None,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct RawExplorer {
    max_items: usize,
}

impl Default for RawExplorer {
    fn default() -> Self {
        RawExplorer {
            max_items: DEFAULT_EXPLORER_ITEMS,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct RawActivation {
    on_busy: String,
    busy_wait_ms: u64,
}

impl Default for RawActivation {
    fn default() -> Self {
        RawActivation {
            on_busy: "wait".to_string(),
            busy_wait_ms: 10_000,
        }
    }
}

/// Main configuration struct for presto.
/// This struct holds the processed configuration options used by presto.
#[derive(Debug, Clone)]
pub struct Settings {
    shortcut_roots: Vec<PathBuf>,
    lists_dir: PathBuf,
    explorer_max_items: usize,
    on_busy: OnBusyActivation,
}

/// Conversion from RawSettings to Settings.
/// This handles any necessary processing of the raw values.
impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        let shortcut_roots = if raw.sources.shortcut_roots.is_empty() {
            default_shortcut_roots()
        } else {
            raw.sources
                .shortcut_roots
                .into_iter()
                .map(PathBuf::from)
                .collect()
        };

        let lists_dir = raw
            .sources
            .lists_dir
            .map(PathBuf::from)
            .unwrap_or_else(default_lists_dir);

        let on_busy = match raw.activation.on_busy.to_lowercase().as_str() {
            "cancel" => OnBusyActivation::CancelAndDismiss,
            "wait" => OnBusyActivation::WaitBounded(Duration::from_millis(
                raw.activation.busy_wait_ms,
            )),
            other => {
                tracing::warn!("unknown activation.on_busy={:?}, using \"wait\"", other);
                OnBusyActivation::WaitBounded(Duration::from_millis(raw.activation.busy_wait_ms))
            }
        };

        Self {
            shortcut_roots,
            lists_dir,
            explorer_max_items: clamp_explorer_items(raw.explorer.max_items),
            on_busy,
        }
    }
}

/// Public methods for loading and accessing the configuration.
impl Settings {
    /// Load configuration from the default path.
    /// If the file does not exist or fails to parse, returns the default configuration.
    ///
    /// Called by the entry point at startup and again for an explicit reload.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from an explicit path, falling back to defaults.
    pub fn load_from(path: &PathBuf) -> Self {
        if !path.exists() {
            eprintln!(
                "No presto.toml config file found. Using internal defaults. (Tip: run 'presto --init' to generate a config file.)"
            );
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<RawSettings>(&content) {
                Ok(raw) => raw.into(),
                Err(e) => {
                    eprintln!("Error parsing config: {}", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    // Getters

    #[inline]
    pub fn shortcut_roots(&self) -> &[PathBuf] {
        &self.shortcut_roots
    }

    #[inline]
    pub fn lists_dir(&self) -> &PathBuf {
        &self.lists_dir
    }

    #[inline]
    pub fn explorer_max_items(&self) -> usize {
        self.explorer_max_items
    }

    #[inline]
    pub fn on_busy(&self) -> OnBusyActivation {
        self.on_busy
    }

    /// Determine the default configuration file path.
    /// Checks the PRESTO_CONFIG environment variable first,
    /// checks for XDG_CONFIG_HOME after,
    /// then defaults to ~/.config/presto/presto.toml.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("PRESTO_CONFIG") {
            return PathBuf::from(path);
        }

        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg_config).join("presto/presto.toml");
        }

        if let Some(home) = get_home() {
            return home.join(".config/presto/presto.toml");
        }
        PathBuf::from("presto.toml")
    }

    /// Generate a default configuration file at the specified path.
    /// If the file already exists, returns an error.
    pub fn generate_default(path: &PathBuf) -> std::io::Result<()> {
        if path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Config file already exists at {:?}", path),
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let default_toml = r##"# presto.toml - default configuration for presto

# Note:
# Commented values are the internal defaults of presto.
# The JSON source lists (search_list.json, uwp_list.json, ignore_list.json,
# func_list.json) are read from sources.lists_dir.

[sources]
# Directories walked for .lnk/.url shortcuts. Empty means the platform
# start menu locations (per-machine and per-user).
# shortcut_roots = []
# Directory holding the JSON source lists. Defaults to the config directory.
# lists_dir = ""

[explorer]
# Listing limit for the file explorer view (clamped to 10..=100).
# max_items = 40

[activation]
# What a link-mode activation does while a load pass is still running:
# "wait" waits up to busy_wait_ms then cancels, "cancel" cancels right away.
# on_busy = "wait"
# busy_wait_ms = 10000
"##;

        fs::write(path, default_toml)?;
        println!("Default config generated at {:?}", path);
        Ok(())
    }
}

/// Default configuration options.
impl Default for Settings {
    fn default() -> Self {
        Settings::from(RawSettings::default())
    }
}

/// The platform start menu shortcut roots, per-machine first.
///
/// Resolved through the environment so the same build runs on hosts where
/// the variables are absent; a missing root is simply skipped by the walk.
fn default_shortcut_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(program_data) = std::env::var("ProgramData") {
        roots.push(PathBuf::from(program_data).join("Microsoft\\Windows\\Start Menu\\Programs"));
    }
    if let Ok(app_data) = std::env::var("APPDATA") {
        roots.push(PathBuf::from(app_data).join("Microsoft\\Windows\\Start Menu\\Programs"));
    }
    roots
}

/// The JSON lists live next to presto.toml unless overridden.
fn default_lists_dir() -> PathBuf {
    let config = Settings::default_path();
    config
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
