// Tool configuration loaded from a TOML file
//
// Every field has a default, so a missing file or section is equivalent to
// the stock dr.cfg layout with a `records.json` store next to the caller.

use crate::core::CfgLayout;
use crate::leaderboard::QueryDefaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Record store snapshot (default: records.json)
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Log filter used when RUST_LOG is unset (default: info)
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Region placement override
    #[serde(default)]
    pub layout: CfgLayout,

    #[serde(default)]
    pub queries: QueryDefaults,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("records.json")
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            log_filter: default_log_filter(),
            layout: CfgLayout::default(),
            queries: QueryDefaults::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `path` when given, otherwise return defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Region;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::load_or_default(None).unwrap();
        assert_eq!(config.store_path, PathBuf::from("records.json"));
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.layout, CfgLayout::default());
        assert_eq!(config.queries.global_limit, 1);
        assert_eq!(config.queries.filtered_limit, 10);
    }

    #[test]
    fn test_partial_file() {
        let text = r#"
            store_path = "data/laps.json"

            [layout]
            lap = { start = 0x10, end = 0x40 }

            [queries]
            filtered_limit = 25
        "#;
        let config = Config::from_toml_str(text, Path::new("test.toml")).unwrap();
        assert_eq!(config.store_path, PathBuf::from("data/laps.json"));
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.layout.lap, Region::new(0x10, 0x40));
        assert_eq!(config.layout.finish, CfgLayout::default().finish);
        assert_eq!(config.queries.global_limit, 1);
        assert_eq!(config.queries.filtered_limit, 25);
    }

    #[test]
    fn test_load_file() {
        let mut tempfile = NamedTempFile::new().unwrap();
        writeln!(tempfile, "log_filter = \"drcfg_rs=debug\"").unwrap();
        tempfile.flush().unwrap();

        let config = Config::load(tempfile.path()).unwrap();
        assert_eq!(config.log_filter, "drcfg_rs=debug");
    }

    #[test]
    fn test_errors_name_the_file() {
        let err = Config::from_toml_str("store_path = [", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
        assert!(err.to_string().contains("bad.toml"));

        let err = Config::load("/nonexistent/drcfg.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
