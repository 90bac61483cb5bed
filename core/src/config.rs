//! User-facing configuration, persisted as config.toml in the data directory.

use crate::error::ConfigError;
use crate::hotkey::Action;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub shortcuts: ShortcutsConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

impl AppConfig {
    /// Returns the config file path within the given data directory.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.toml")
    }

    /// Loads config from a TOML file. Returns default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates config values and returns list of validation errors.
    /// Returns empty vec if config is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.window.width <= 0 || self.window.height <= 0 {
            errors.push("window width and height must be positive".to_string());
        }
        if self.window.move_divisor == 0 {
            errors.push("move_divisor must be at least 1".to_string());
        }
        if self.window.frame_ms == 0 {
            errors.push("frame_ms must be at least 1".to_string());
        }
        if self.ai.model.trim().is_empty() {
            errors.push("ai.model must not be empty".to_string());
        }

        errors
    }

    /// Returns a validated config, replacing invalid values with defaults.
    pub fn with_defaults_for_invalid(&self) -> Self {
        let defaults = WindowConfig::default();
        let window = &self.window;
        Self {
            shortcuts: self.shortcuts.clone(),
            window: WindowConfig {
                width: if window.width > 0 { window.width } else { defaults.width },
                height: if window.height > 0 {
                    window.height
                } else {
                    defaults.height
                },
                move_divisor: if window.move_divisor == 0 {
                    defaults.move_divisor
                } else {
                    window.move_divisor
                },
                frame_ms: if window.frame_ms == 0 {
                    defaults.frame_ms
                } else {
                    window.frame_ms
                },
                ..window.clone()
            },
            ai: AiConfig {
                model: if self.ai.model.trim().is_empty() {
                    AiConfig::default().model
                } else {
                    self.ai.model.clone()
                },
                ..self.ai.clone()
            },
        }
    }
}

/// Global shortcut bindings, one per action. An empty string disables the action.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutsConfig {
    pub toggle: String,
    pub move_left: String,
    pub move_right: String,
    pub move_up: String,
    pub move_down: String,
    pub scroll_up: String,
    pub scroll_down: String,
    pub quit: String,
    pub screenshot: String,
    pub minimize: String,
    pub clear_chat: String,
    pub send_with_screenshot: String,
    pub send_with_screenshot_fix: String,
}

impl ShortcutsConfig {
    /// Returns the configured shortcut string for an action.
    pub fn get(&self, action: Action) -> &str {
        match action {
            Action::ToggleVisibility => &self.toggle,
            Action::MoveLeft => &self.move_left,
            Action::MoveRight => &self.move_right,
            Action::MoveUp => &self.move_up,
            Action::MoveDown => &self.move_down,
            Action::ScrollUp => &self.scroll_up,
            Action::ScrollDown => &self.scroll_down,
            Action::Quit => &self.quit,
            Action::Screenshot => &self.screenshot,
            Action::Minimize => &self.minimize,
            Action::ClearChat => &self.clear_chat,
            Action::SendWithScreenshot => &self.send_with_screenshot,
            Action::SendWithScreenshotFix => &self.send_with_screenshot_fix,
        }
    }
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self {
            toggle: "Ctrl+KeyE".to_string(),
            move_left: "Ctrl+Alt+ArrowLeft".to_string(),
            move_right: "Ctrl+Alt+ArrowRight".to_string(),
            move_up: "Ctrl+Alt+ArrowUp".to_string(),
            move_down: "Ctrl+Alt+ArrowDown".to_string(),
            scroll_up: "Ctrl+Shift+ArrowUp".to_string(),
            scroll_down: "Ctrl+Shift+ArrowDown".to_string(),
            quit: "Ctrl+Shift+KeyQ".to_string(),
            screenshot: "Ctrl+Shift+KeyS".to_string(),
            minimize: "Ctrl+Shift+KeyM".to_string(),
            clear_chat: "Ctrl+Shift+KeyX".to_string(),
            send_with_screenshot: "Ctrl+Enter".to_string(),
            send_with_screenshot_fix: "Ctrl+Shift+Enter".to_string(),
        }
    }
}

/// Overlay window geometry and motion tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: i32,
    pub height: i32,
    /// Pixels always kept between the window and the work-area edge.
    pub edge_margin: i32,
    /// A move step is the work-area size divided by this value.
    pub move_divisor: u32,
    pub animation_ms: u32,
    pub frame_ms: u32,
    pub scroll_step: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 550,
            height: 600,
            edge_margin: 2,
            move_divisor: 14,
            animation_ms: 100,
            frame_ms: 8,
            scroll_step: 100,
        }
    }
}

/// Language model provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub endpoint: String,
    /// Prompt sent by the send-with-screenshot-fix shortcut.
    pub fix_prompt: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            fix_prompt: "Find and fix the problem shown in this screenshot.".to_string(),
        }
    }
}

/// Returns the data directory: `WHISPR_DATA_DIR`, else `%LOCALAPPDATA%\whispr`,
/// else `./whispr-data`.
pub fn data_dir() -> PathBuf {
    std::env::var_os("WHISPR_DATA_DIR")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("LOCALAPPDATA").map(|dir| PathBuf::from(dir).join("whispr")))
        .unwrap_or_else(|| PathBuf::from("whispr-data"))
}

/// Directory captured screenshots are written to.
pub fn screenshots_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("cache").join("screenshots")
}
