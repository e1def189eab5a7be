use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Parser, Debug, Clone)]
#[command(name = "xmlfs")]
#[command(about = "Mount an XML document as a read-only directory tree")]
#[command(version)]
pub struct Cli {
    /// XML document to project
    pub document: PathBuf,

    /// Directory to mount on
    pub mountpoint: PathBuf,

    /// Path to config file (default: ~/.config/xmlfs/config.toml)
    #[arg(short, long, env = "XMLFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Allow other users to access the mount
    #[arg(long)]
    pub allow_other: bool,

    /// Unmount automatically when the process exits
    #[arg(long)]
    pub auto_unmount: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Layer command-line flags over file configuration
    pub fn apply(&self, config: &mut Config) {
        if self.allow_other {
            config.mount.allow_other = true;
        }
        if self.auto_unmount {
            config.mount.auto_unmount = true;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["xmlfs", "doc.xml", "/mnt/doc"]).unwrap();
        assert_eq!(cli.document, PathBuf::from("doc.xml"));
        assert_eq!(cli.mountpoint, PathBuf::from("/mnt/doc"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_missing_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["xmlfs"]).is_err());
        assert!(Cli::try_parse_from(["xmlfs", "doc.xml"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "xmlfs",
            "doc.xml",
            "/mnt/doc",
            "--allow-other",
            "--auto-unmount",
            "-v",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply(&mut config);
        assert!(config.mount.allow_other);
        assert!(config.mount.auto_unmount);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let cli = Cli::try_parse_from(["xmlfs", "doc.xml", "/mnt/doc"]).unwrap();
        let mut config = Config::default();
        config.mount.allow_other = true;
        cli.apply(&mut config);
        assert!(config.mount.allow_other);
        assert_eq!(config.logging.level, "info");
    }
}
