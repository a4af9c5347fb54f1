use std::{env, path::PathBuf};

use anyhow::{Context, Result};

const APP_DIR_NAME: &str = "daybudget";

/// Resolves the default application state directory and makes sure it
/// exists. `$XDG_STATE_HOME` (or `$HOME/.local/state`) on unix, `%APPDATA%`
/// on Windows.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = state_root()?;
    path.push(APP_DIR_NAME);

    std::fs::create_dir_all(&path)
        .with_context(|| format!("Couldn't create application directory {path:?}"))?;
    Ok(path)
}

#[cfg(windows)]
fn state_root() -> Result<PathBuf> {
    env::var("APPDATA")
        .map(PathBuf::from)
        .context("APPDATA should be present on Windows")
}

#[cfg(not(windows))]
fn state_root() -> Result<PathBuf> {
    if let Ok(state_home) = env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(state_home));
    }
    let home = env::var("HOME").context("Couldn't find neither XDG_STATE_HOME nor HOME")?;
    Ok(PathBuf::from(home).join(".local/state"))
}
