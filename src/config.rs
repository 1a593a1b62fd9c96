//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--data-dir`, `--theme`)
//! 2. `$SKETCH_CONFIG` environment variable (path to config file)
//! 3. Project-local `.sketch.toml` in the current working directory
//! 4. Global `~/.config/codebase-sketch/config.toml`
//! 5. Built-in defaults

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// Directory name used under the platform config and data directories.
pub const APP_DIR_NAME: &str = "codebase-sketch";

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the saved tree and scratch note.
    pub data_dir: Option<String>,
    /// Confirm before deleting a subtree.
    pub confirm_delete: Option<bool>,
}

/// Tree panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
}

/// Content editor settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EditorConfig {
    /// Syntax highlighting theme (syntect theme name).
    pub syntax_theme: Option<String>,
    /// Spaces inserted by Tab.
    pub tab_width: Option<usize>,
}

/// Log file settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `"debug"` or `"sketch::tree=trace"`.
    pub level: Option<String>,
    /// Directory for log files (defaults to `<data_dir>/logs`).
    pub directory: Option<String>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_dir_fg: Option<String>,
    pub tree_file_fg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub border_focused_fg: Option<String>,
    pub dialog_border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub editor: EditorConfig,
    pub log: LogConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default syntax theme for the content editor.
pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";
/// Default number of spaces inserted by Tab in the editor.
pub const DEFAULT_TAB_WIDTH: usize = 4;
/// Default log filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; the caller handles that.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("SKETCH_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".sketch.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_DIR_NAME).join("config.toml"));
    }

    paths
}

/// A config file that exists but could not be parsed. Collected while
/// loading so it can be reported once logging is set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub path: PathBuf,
    pub message: String,
}

impl ConfigWarning {
    /// Emit the warning through `tracing`.
    pub fn log(&self) {
        warn!(path = %self.path.display(), "failed to parse config file: {}", self.message);
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ignoring config file {}: {}", self.path.display(), self.message)
    }
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed; a parse failure is pushed onto
/// `warnings`.
fn load_file(path: &Path, warnings: &mut Vec<ConfigWarning>) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warnings.push(ConfigWarning {
                path: path.to_path_buf(),
                message: e.message().to_string(),
            });
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                data_dir: other
                    .general
                    .data_dir
                    .clone()
                    .or(self.general.data_dir),
                confirm_delete: other.general.confirm_delete.or(self.general.confirm_delete),
            },
            tree: TreeConfig {
                use_icons: other.tree.use_icons.or(self.tree.use_icons),
            },
            editor: EditorConfig {
                syntax_theme: other
                    .editor
                    .syntax_theme
                    .clone()
                    .or(self.editor.syntax_theme),
                tab_width: other.editor.tab_width.or(self.editor.tab_width),
            },
            log: LogConfig {
                level: other.log.level.clone().or(self.log.level),
                directory: other.log.directory.clone().or(self.log.directory),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: match (&self.theme.custom, &other.theme.custom) {
                    (_, Some(o)) => Some(o.clone()),
                    (Some(s), None) => Some(s.clone()),
                    (None, None) => None,
                },
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags. Files
    /// that fail to parse are skipped and returned as warnings.
    pub fn load(
        cli_config_path: Option<&Path>,
        cli_overrides: Option<&AppConfig>,
    ) -> (AppConfig, Vec<ConfigWarning>) {
        let mut config = AppConfig::default();
        let mut warnings = Vec::new();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path, &mut warnings) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path, &mut warnings) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        (config, warnings)
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Directory holding the saved tree and scratch note.
    pub fn data_dir(&self) -> PathBuf {
        match &self.general.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR_NAME),
        }
    }

    /// Whether to confirm before delete.
    pub fn confirm_delete(&self) -> bool {
        self.general.confirm_delete.unwrap_or(true)
    }

    /// Whether to use nerd font icons.
    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(true)
    }

    /// Syntax highlighting theme name.
    pub fn syntax_theme_name(&self) -> &str {
        self.editor
            .syntax_theme
            .as_deref()
            .unwrap_or(DEFAULT_SYNTAX_THEME)
    }

    /// Spaces inserted by Tab in the editor.
    pub fn tab_width(&self) -> usize {
        self.editor.tab_width.unwrap_or(DEFAULT_TAB_WIDTH).max(1)
    }

    /// Log filter directive.
    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        match &self.log.directory {
            Some(dir) => PathBuf::from(dir),
            None => self.data_dir().join("logs"),
        }
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
