//! Configuration handling for xmlfs.
//!
//! Settings come from an optional TOML file; command-line flags are applied
//! on top by the binary.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub mount: MountConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Mount-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// Filesystem name shown in the mount table
    pub fs_name: String,
    /// Allow other users to access the mount
    pub allow_other: bool,
    /// Unmount when the process exits
    pub auto_unmount: bool,
    /// How long the kernel may cache attributes and entries, in seconds
    pub ttl_secs: u64,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fs_name: "xmlfs".to_string(),
            allow_other: false,
            auto_unmount: false,
            ttl_secs: 1,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Default config file location (`~/.config/xmlfs/config.toml` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "xmlfs").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn from_toml(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &contents)
    }

    /// Load an explicitly named file, or the default file if it exists.
    ///
    /// A missing default file yields the built-in defaults; a missing
    /// explicit file is an error.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml(Path::new("empty.toml"), "").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.mount.fs_name, "xmlfs");
        assert_eq!(config.mount.ttl_secs, 1);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml(
            Path::new("partial.toml"),
            "[mount]\nallow_other = true\nttl_secs = 30\n",
        )
        .unwrap();
        assert!(config.mount.allow_other);
        assert_eq!(config.mount.ttl_secs, 30);
        assert_eq!(config.mount.fs_name, "xmlfs");
        assert!(!config.mount.auto_unmount);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::from_toml(Path::new("bad.toml"), "[mount]\nttl_secs = \"soon\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = Config::load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Config::load_or_default(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
