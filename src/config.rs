// Configuration file (~/.merit/rc) handling
//
// The rc file holds `key=value` lines. Blank lines and lines starting with
// '#' are ignored. Known keys:
//   data.location=<path>   database file; relative paths resolve against ~/.merit
//   user.name=<name>       default acting user

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the acting user
pub const USER_ENV_VAR: &str = "MERIT_USER";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub data_location: Option<PathBuf>,
    pub user_name: Option<String>,
}

impl Config {
    /// Directory holding the rc file and the default database
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;
        Ok(home.join(".merit"))
    }

    pub fn rc_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("rc"))
    }

    /// Load the rc file, returning defaults when it does not exist
    pub fn load() -> Result<Self> {
        let path = Self::rc_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::parse(&content, base))
    }

    /// Parse rc content. Relative data paths resolve against `base`.
    pub fn parse(content: &str, base: &Path) -> Self {
        let mut config = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("Ignoring malformed config line: {}", line);
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = Some(if path.is_relative() {
                        base.join(path)
                    } else {
                        path
                    });
                }
                "user.name" if !value.is_empty() => {
                    config.user_name = Some(value.to_string());
                }
                other => log::debug!("Ignoring unknown config key: {}", other),
            }
        }
        config
    }

    /// Database path: `data.location` or ~/.merit/merit.db
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.data_location {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home_dir()?.join("merit.db")),
        }
    }

    /// Acting user name: explicit flag, then $MERIT_USER, then `user.name`
    pub fn resolve_user(&self, flag: Option<&str>) -> Option<String> {
        if let Some(name) = flag {
            return Some(name.to_string());
        }
        if let Ok(name) = std::env::var(USER_ENV_VAR) {
            if !name.trim().is_empty() {
                return Some(name.trim().to_string());
            }
        }
        self.user_name.clone()
    }
}
