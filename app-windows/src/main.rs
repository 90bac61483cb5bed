//! Whispr: an always-on-top chat overlay for a cloud language model, driven by
//! global hotkeys.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(windows)]
mod app;
#[cfg(windows)]
mod error;
#[cfg(windows)]
mod platform;
#[cfg(windows)]
mod render;

use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    #[cfg(windows)]
    if let Err(e) = run() {
        error!(error = %e, "whispr exited with an error");
        std::process::exit(1);
    }

    #[cfg(not(windows))]
    error!("whispr needs Windows: the global keyboard hook and overlay are Win32-only");
}

#[cfg(windows)]
fn run() -> Result<(), error::AppError> {
    use tracing::info;
    use whispr_core::config::{AppConfig, data_dir};

    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir)?;
    info!(data_dir = %data_dir.display(), "starting");

    let config = load_config(&AppConfig::path(&data_dir));
    platform::window::run(config, &data_dir)
}

/// Loads config.toml, writing defaults on first run. Invalid values fall back to defaults.
#[cfg(windows)]
fn load_config(path: &std::path::Path) -> whispr_core::config::AppConfig {
    use tracing::warn;
    use whispr_core::config::AppConfig;

    if !path.exists()
        && let Err(e) = AppConfig::default().save(path)
    {
        warn!(error = %e, "could not write default config");
    }

    match AppConfig::load(path) {
        Ok(config) => {
            for problem in config.validate() {
                warn!(%problem, "config value replaced with default");
            }
            config.with_defaults_for_invalid()
        }
        Err(e) => {
            warn!(error = %e, "config unreadable, using defaults");
            AppConfig::default()
        }
    }
}
