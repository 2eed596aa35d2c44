use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "screen-wizard";

/// Folder the executable runs from, or the current directory.
pub fn resolve_deployment_folder() -> Result<PathBuf> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return Ok(dir.to_path_buf());
        }
    }

    std::env::current_dir().context("Failed to resolve current directory")
}

/// Resolve log folder (absolute path)
pub fn resolve_log_folder() -> Result<PathBuf> {
    // Per-user data dir first; the deployment folder when the platform has none.
    let base = match dirs::data_local_dir() {
        Some(dir) => dir.join(APP_DIR),
        None => resolve_deployment_folder()?,
    };
    let log_dir = base.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log folder {:?}", log_dir))?;
    Ok(log_dir)
}

/// Default location of `settings.toml`. Not created; a missing file just means defaults.
pub fn default_settings_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("settings.toml"))
}
