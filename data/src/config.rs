use crate::chart::ChartConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn save_config(config: &ChartConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Loads a persisted chart configuration.
///
/// A file that exists but no longer parses is renamed to a `_old` sibling
/// before the parse error is returned, so a hand-edited or version-skewed
/// config can be recovered manually instead of being overwritten on the
/// next save.
pub fn load_config(path: &Path) -> Result<ChartConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;

    match serde_json::from_str(&contents) {
        Ok(config) => Ok(config),
        Err(err) => {
            let backup = backup_path(path);
            if let Err(rename_err) = std::fs::rename(path, &backup) {
                log::warn!(
                    "failed to back up corrupted config {} to {}: {}",
                    path.display(),
                    backup.display(),
                    rename_err
                );
            } else {
                log::info!("backed up corrupted config to {}", backup.display());
            }
            Err(err.into())
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("config");
    let backup_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_old.{ext}"),
        None => format!("{stem}_old"),
    };
    path.with_file_name(backup_name)
}
