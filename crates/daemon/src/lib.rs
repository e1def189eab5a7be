pub mod cli;
pub mod config;
#[cfg(feature = "fuse")]
pub mod fuse;
pub mod loader;
pub mod logging;

pub use cli::Cli;
pub use config::{Config, ConfigError, LoggingConfig, MountConfig};
pub use loader::{load, LoadError};
