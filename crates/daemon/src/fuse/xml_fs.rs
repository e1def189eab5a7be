//! FUSE filesystem over a projection.
//!
//! Translates inode-addressed kernel requests into path-addressed
//! [`FilesystemOps`] calls. The only state kept here is the inode table.

use std::ffi::OsStr;
use std::time::Duration;

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEntry, ReplyOpen,
    ReplyStatfs, Request,
};
use libc::{c_int, EINVAL, EISDIR, ENOENT, ENOTDIR};
use tracing::{debug, info};

use common::{Attributes, EntryKind, FilesystemOps, FsStats, ProjectionError, VirtualEntry};

use super::InodeTable;

/// Longest entry name reported through statfs
const NAME_MAX: u32 = 255;

/// Map a projection error onto the errno handed back to the kernel
pub fn errno(err: &ProjectionError) -> c_int {
    match err {
        ProjectionError::NotFound { .. } => ENOENT,
    }
}

fn file_type(kind: EntryKind) -> FileType {
    match kind {
        EntryKind::Directory => FileType::Directory,
        EntryKind::File => FileType::RegularFile,
    }
}

/// One `readdir` entry: inode, type, name
pub type DirEntry = (u64, FileType, String);

/// Read-only FUSE filesystem backed by a [`FilesystemOps`] implementation
pub struct XmlFs<O> {
    ops: O,
    inodes: InodeTable,
    ttl: Duration,
    uid: u32,
    gid: u32,
}

impl<O: FilesystemOps> XmlFs<O> {
    /// Entries are owned by the mounting user.
    #[allow(unsafe_code)]
    pub fn new(ops: O, ttl: Duration) -> Self {
        // SAFETY: getuid() and getgid() are always safe to call
        let uid = unsafe { libc::getuid() };
        let gid = unsafe { libc::getgid() };
        Self {
            ops,
            inodes: InodeTable::new(),
            ttl,
            uid,
            gid,
        }
    }

    pub fn inodes(&self) -> &InodeTable {
        &self.inodes
    }

    fn path_of(&self, ino: u64) -> Result<String, c_int> {
        self.inodes.get_path(ino).map(str::to_string).ok_or(ENOENT)
    }

    fn kind_of(&self, path: &str) -> Result<EntryKind, c_int> {
        self.ops
            .get_attributes(path)
            .map(|attr| attr.kind)
            .map_err(|e| errno(&e))
    }

    fn file_attr(&self, ino: u64, attr: &Attributes) -> FileAttr {
        let block_size = FsStats::default().block_size;
        FileAttr {
            ino,
            size: attr.size,
            blocks: attr.size.div_ceil(u64::from(block_size)),
            atime: attr.times.accessed,
            mtime: attr.times.modified,
            ctime: attr.times.changed,
            crtime: attr.times.changed,
            kind: file_type(attr.kind),
            perm: attr.perm(),
            nlink: attr.nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: block_size,
            flags: 0,
        }
    }

    /// Resolve `name` inside directory `parent`, assigning it an inode.
    pub fn lookup_entry(&mut self, parent: u64, name: &str) -> Result<FileAttr, c_int> {
        let parent_path = self.path_of(parent)?;
        if self.kind_of(&parent_path)? == EntryKind::File {
            return Err(ENOTDIR);
        }
        let path = InodeTable::child_path(&parent_path, name);
        let attr = self.ops.get_attributes(&path).map_err(|e| errno(&e))?;
        let ino = self.inodes.get_or_create(&path);
        Ok(self.file_attr(ino, &attr))
    }

    pub fn attr_of(&self, ino: u64) -> Result<FileAttr, c_int> {
        let path = self.path_of(ino)?;
        let attr = self.ops.get_attributes(&path).map_err(|e| errno(&e))?;
        Ok(self.file_attr(ino, &attr))
    }

    pub fn open_inode(&self, ino: u64, flags: i32) -> Result<u64, c_int> {
        let path = self.path_of(ino)?;
        Ok(self.ops.open(&path, flags))
    }

    pub fn read_at(&self, ino: u64, fh: u64, offset: i64, size: u32) -> Result<Vec<u8>, c_int> {
        let offset = u64::try_from(offset).map_err(|_| EINVAL)?;
        let path = self.path_of(ino)?;
        if self.kind_of(&path)? == EntryKind::Directory {
            return Err(EISDIR);
        }
        let data = self
            .ops
            .read(&path, size as usize, offset, fh)
            .map_err(|e| errno(&e))?;
        Ok(data.into_owned())
    }

    /// Listing of a directory inode, starting after the first `offset`
    /// entries. Every entry gets an inode so a later lookup is stable.
    pub fn dir_entries(&mut self, ino: u64, fh: u64, offset: i64) -> Result<Vec<DirEntry>, c_int> {
        let skip = usize::try_from(offset).map_err(|_| EINVAL)?;
        let path = self.path_of(ino)?;
        if self.kind_of(&path)? == EntryKind::File {
            return Err(ENOTDIR);
        }
        let names = self.ops.list_directory(&path, fh);

        let entries = names
            .into_iter()
            .skip(skip)
            .map(|name| {
                let entry_ino = match name.as_str() {
                    "." => ino,
                    ".." => self.inodes.get_or_create(&InodeTable::parent_path(&path)),
                    _ => self
                        .inodes
                        .get_or_create(&InodeTable::child_path(&path, &name)),
                };
                (entry_ino, file_type(VirtualEntry::kind_of(&name)), name)
            })
            .collect();
        Ok(entries)
    }

    pub fn stats_of(&self, ino: u64) -> Result<FsStats, c_int> {
        let path = self.path_of(ino)?;
        Ok(self.ops.filesystem_stats(&path))
    }
}

impl<O: FilesystemOps> Filesystem for XmlFs<O> {
    fn init(
        &mut self,
        _req: &Request<'_>,
        _config: &mut fuser::KernelConfig,
    ) -> Result<(), c_int> {
        info!("filesystem mounted");
        Ok(())
    }

    fn destroy(&mut self) {
        info!(inodes = self.inodes.len(), "filesystem unmounted");
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let name = name.to_string_lossy();
        debug!("lookup: parent={}, name={}", parent, name);

        match self.lookup_entry(parent, &name) {
            Ok(attr) => reply.entry(&self.ttl, &attr, 0),
            Err(code) => {
                debug!("lookup failed: parent={}, name={}, errno={}", parent, name, code);
                reply.error(code)
            }
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        debug!("getattr: ino={}", ino);

        match self.attr_of(ino) {
            Ok(attr) => reply.attr(&self.ttl, &attr),
            Err(code) => reply.error(code),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        debug!("open: ino={}, flags={}", ino, flags);

        match self.open_inode(ino, flags) {
            Ok(fh) => reply.opened(fh, 0),
            Err(code) => reply.error(code),
        }
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        debug!("opendir: ino={}, flags={}", ino, flags);

        match self.open_inode(ino, flags) {
            Ok(fh) => reply.opened(fh, 0),
            Err(code) => reply.error(code),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        debug!("read: ino={}, offset={}, size={}", ino, offset, size);

        match self.read_at(ino, fh, offset, size) {
            Ok(data) => reply.data(&data),
            Err(code) => reply.error(code),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        debug!("readdir: ino={}, offset={}", ino, offset);

        let entries = match self.dir_entries(ino, fh, offset) {
            Ok(entries) => entries,
            Err(code) => {
                reply.error(code);
                return;
            }
        };

        for (i, (entry_ino, kind, name)) in entries.iter().enumerate() {
            // The offset handed back is where the next call resumes.
            let next = offset + i as i64 + 1;
            if reply.add(*entry_ino, next, *kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn statfs(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyStatfs) {
        debug!("statfs: ino={}", ino);

        match self.stats_of(ino) {
            Ok(stats) => reply.statfs(
                stats.total_blocks,
                stats.available_blocks,
                stats.available_blocks,
                0,
                0,
                stats.block_size,
                NAME_MAX,
                stats.block_size,
            ),
            Err(code) => reply.error(code),
        }
    }
}
