use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::PlannerConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable naming the data directory when `-C` is not given
pub const DATA_DIR_ENV: &str = "PRIORITY_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Pick the data directory: the `-C` flag, then `$PRIORITY_DIR`, then the
/// current directory.
pub fn resolve_data_dir(flag: Option<&str>) -> Result<PathBuf, std::io::Error> {
    if let Some(dir) = flag {
        return Ok(PathBuf::from(dir));
    }
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
        _ => std::env::current_dir(),
    }
}

/// Read config.toml from the data directory. A missing file means defaults.
pub fn read_config(data_dir: &Path) -> Result<PlannerConfig, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(PlannerConfig::default());
        }
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })
}
