//! # xmlfs
//!
//! Mounts an XML document as a read-only directory tree: every element is a
//! directory, repeated sibling tags get `[n]` suffixes, and each directory
//! holds a `#contents` file with the element's text.
//!
//! ```bash
//! xmlfs catalog.xml /mnt/catalog
//! ls /mnt/catalog/catalog/
//! cat '/mnt/catalog/catalog/book[2]/#contents'
//! fusermount -u /mnt/catalog
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use xmlfs_daemon::{Cli, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        Config::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);

    xmlfs_daemon::logging::init(&config.logging.level)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    run(&cli, &config)
}

#[cfg(feature = "fuse")]
fn run(cli: &Cli, config: &Config) -> Result<()> {
    let projector = xmlfs_daemon::load(&cli.document)
        .with_context(|| format!("Failed to load {}", cli.document.display()))?;

    xmlfs_daemon::fuse::mount(projector, &cli.mountpoint, &config.mount)
        .with_context(|| format!("Failed to mount at {}", cli.mountpoint.display()))?;

    Ok(())
}

#[cfg(not(feature = "fuse"))]
fn run(_cli: &Cli, _config: &Config) -> Result<()> {
    anyhow::bail!("xmlfs was built without the `fuse` feature; rebuild with --features fuse")
}
