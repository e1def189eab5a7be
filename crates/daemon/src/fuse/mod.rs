//! FUSE integration for xmlfs
//!
//! Mounts a projection as a read-only local directory tree.
//!
//! # Architecture
//!
//! - `XmlFs`: FUSE filesystem implementation using fuser, delegating every
//!   request to a [`FilesystemOps`] implementation
//! - `InodeTable`: Bidirectional inode ↔ path mapping

mod inode_table;
mod xml_fs;

use std::io;
use std::path::Path;
use std::time::Duration;

use fuser::MountOption;
use tracing::info;

use common::FilesystemOps;

use crate::config::MountConfig;

pub use inode_table::InodeTable;
pub use xml_fs::{errno, DirEntry, XmlFs};

/// Mount options derived from configuration
pub fn mount_options(config: &MountConfig) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName(config.fs_name.clone()),
        MountOption::Subtype("xmlfs".to_string()),
        MountOption::RO,
    ];

    if config.allow_other {
        options.push(MountOption::AllowOther);
    }
    if config.auto_unmount {
        options.push(MountOption::AutoUnmount);
    }

    options
}

/// Mount `ops` at `mountpoint`, blocking until the filesystem is unmounted.
pub fn mount<O>(ops: O, mountpoint: &Path, config: &MountConfig) -> io::Result<()>
where
    O: FilesystemOps + 'static,
{
    let fs = XmlFs::new(ops, Duration::from_secs(config.ttl_secs));
    let options = mount_options(config);

    info!(
        mountpoint = %mountpoint.display(),
        fs_name = %config.fs_name,
        "mounting (Ctrl+C or fusermount -u to unmount)"
    );
    fuser::mount2(fs, mountpoint, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_read_only() {
        let options = mount_options(&MountConfig::default());
        assert!(options.contains(&MountOption::RO));
        assert!(options.contains(&MountOption::FSName("xmlfs".to_string())));
        assert!(!options.contains(&MountOption::AllowOther));
        assert!(!options.contains(&MountOption::AutoUnmount));
    }

    #[test]
    fn test_optional_options() {
        let config = MountConfig {
            allow_other: true,
            auto_unmount: true,
            fs_name: "catalog".to_string(),
            ..MountConfig::default()
        };
        let options = mount_options(&config);
        assert!(options.contains(&MountOption::AllowOther));
        assert!(options.contains(&MountOption::AutoUnmount));
        assert!(options.contains(&MountOption::FSName("catalog".to_string())));
    }
}
