//! Synthetic metadata for projected entries.

use std::fs::Metadata;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Directory vs regular file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
}

/// Timestamps copied from the backing document file at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub accessed: SystemTime,
    pub modified: SystemTime,
    pub changed: SystemTime,
}

impl Default for FileTimes {
    fn default() -> Self {
        Self::fixed(UNIX_EPOCH)
    }
}

impl FileTimes {
    /// All three timestamps set to the same instant
    pub fn fixed(at: SystemTime) -> Self {
        Self {
            accessed: at,
            modified: at,
            changed: at,
        }
    }

    pub fn from_metadata(metadata: &Metadata) -> Self {
        let accessed = metadata.accessed().unwrap_or(UNIX_EPOCH);
        let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
        Self {
            accessed,
            modified,
            changed: status_change_time(metadata).unwrap_or(modified),
        }
    }
}

#[cfg(unix)]
fn status_change_time(metadata: &Metadata) -> Option<SystemTime> {
    use std::os::unix::fs::MetadataExt;

    let secs = u64::try_from(metadata.ctime()).ok()?;
    let nanos = u32::try_from(metadata.ctime_nsec()).unwrap_or(0);
    Some(UNIX_EPOCH + Duration::new(secs, nanos))
}

#[cfg(not(unix))]
fn status_change_time(_metadata: &Metadata) -> Option<SystemTime> {
    None
}

/// Attributes reported for a projected path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    pub kind: EntryKind,
    /// Content length for files, zero for directories
    pub size: u64,
    pub nlink: u32,
    pub times: FileTimes,
}

impl Attributes {
    /// rw-r--r--
    pub const FILE_PERM: u16 = 0o644;
    /// rwxr-xr-x
    pub const DIR_PERM: u16 = 0o755;

    /// `.`, `..` and the contents file
    pub const FIXED_DIR_LINKS: u32 = 3;

    pub fn file(size: u64, times: FileTimes) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            nlink: 1,
            times,
        }
    }

    /// Directory attributes for a node with `children` listing entries
    pub fn directory(children: usize, times: FileTimes) -> Self {
        let children = u32::try_from(children).unwrap_or(u32::MAX);
        Self {
            kind: EntryKind::Directory,
            size: 0,
            nlink: children.saturating_add(Self::FIXED_DIR_LINKS),
            times,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn perm(&self) -> u16 {
        match self.kind {
            EntryKind::Directory => Self::DIR_PERM,
            EntryKind::File => Self::FILE_PERM,
        }
    }
}

/// Filesystem-wide statistics. Constant; unrelated to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    pub block_size: u32,
    pub total_blocks: u64,
    pub available_blocks: u64,
}

impl Default for FsStats {
    fn default() -> Self {
        Self {
            block_size: 512,
            total_blocks: 4096,
            available_blocks: 2048,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_links() {
        let attr = Attributes::directory(0, FileTimes::default());
        assert_eq!(attr.nlink, 3);
        assert_eq!(attr.size, 0);
        assert!(attr.is_dir());
        assert_eq!(attr.perm(), 0o755);

        assert_eq!(Attributes::directory(4, FileTimes::default()).nlink, 7);
    }

    #[test]
    fn test_directory_links_saturate() {
        let attr = Attributes::directory(usize::MAX, FileTimes::default());
        assert_eq!(attr.nlink, u32::MAX);
    }

    #[test]
    fn test_file_attributes() {
        let attr = Attributes::file(42, FileTimes::default());
        assert_eq!(attr.kind, EntryKind::File);
        assert_eq!(attr.size, 42);
        assert_eq!(attr.nlink, 1);
        assert_eq!(attr.perm(), 0o644);
    }

    #[test]
    fn test_times_from_metadata() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let metadata = file.as_file().metadata().unwrap();
        let times = FileTimes::from_metadata(&metadata);
        assert_eq!(times.modified, metadata.modified().unwrap());
        assert!(times.changed > UNIX_EPOCH);
    }

    #[test]
    fn test_fixed_stats() {
        let stats = FsStats::default();
        assert_eq!(stats.block_size, 512);
        assert_eq!(stats.total_blocks, 4096);
        assert_eq!(stats.available_blocks, 2048);
    }
}
