use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR_NAME: &str = "Homestead";

/// Application data root.
///
/// - macOS: ~/Library/Application Support/Homestead
/// - Windows: %APPDATA%\Homestead
/// - Linux: $XDG_DATA_HOME/Homestead or ~/.local/share/Homestead
///
/// Directories are not created here; callers create them when they write.
pub fn app_data_dir() -> Result<PathBuf> {
    let base_dir = platform_data_dir().context("Failed to get platform-specific data directory")?;

    Ok(base_dir.join(APP_DIR_NAME))
}

pub fn logs_dir() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("logs"))
}

/// Where the signup checkpoint lives.
pub fn signup_dir() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("signup"))
}

fn platform_data_dir() -> Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        if let Some(xdg_data_home) = std::env::var_os("XDG_DATA_HOME") {
            return Ok(PathBuf::from(xdg_data_home));
        }
    }

    dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Unable to determine the user data directory"))
}
