//! Bidirectional inode ↔ projection path mapping
//!
//! FUSE addresses entries by 64-bit inode numbers while the projector is
//! addressed by path. Inodes are handed out on first sight of a path and
//! never recycled; the document cannot change, so a path keeps naming the
//! same node for the life of the mount.

use std::collections::HashMap;

/// Bidirectional mapping between inodes and projection paths
#[derive(Debug)]
pub struct InodeTable {
    path_to_inode: HashMap<String, u64>,
    inode_to_path: HashMap<u64, String>,
    /// Next unassigned inode (1 is the root)
    next_inode: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    /// Root inode number (always 1 in FUSE)
    pub const ROOT_INODE: u64 = 1;

    /// Create a new inode table with root pre-registered
    pub fn new() -> Self {
        let mut table = Self {
            path_to_inode: HashMap::new(),
            inode_to_path: HashMap::new(),
            next_inode: Self::ROOT_INODE + 1,
        };

        table
            .path_to_inode
            .insert("/".to_string(), Self::ROOT_INODE);
        table
            .inode_to_path
            .insert(Self::ROOT_INODE, "/".to_string());

        table
    }

    /// Get or assign the inode for a path
    pub fn get_or_create(&mut self, path: &str) -> u64 {
        let normalized = Self::normalize_path(path);

        if let Some(&inode) = self.path_to_inode.get(&normalized) {
            return inode;
        }

        let inode = self.next_inode;
        self.next_inode += 1;
        self.path_to_inode.insert(normalized.clone(), inode);
        self.inode_to_path.insert(inode, normalized);
        inode
    }

    pub fn get_inode(&self, path: &str) -> Option<u64> {
        let normalized = Self::normalize_path(path);
        self.path_to_inode.get(&normalized).copied()
    }

    pub fn get_path(&self, inode: u64) -> Option<&str> {
        self.inode_to_path.get(&inode).map(String::as_str)
    }

    /// Number of known paths, root included
    pub fn len(&self) -> usize {
        self.inode_to_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inode_to_path.is_empty()
    }

    /// Leading slash, no trailing slash; the root is `/`
    fn normalize_path(path: &str) -> String {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return "/".to_string();
        }

        if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Path of an entry named `name` inside `parent`
    pub fn child_path(parent: &str, name: &str) -> String {
        let parent = Self::normalize_path(parent);
        if parent == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", parent, name)
        }
    }

    /// Get the parent path of a given path
    pub fn parent_path(path: &str) -> String {
        let normalized = Self::normalize_path(path);

        match normalized.rfind('/') {
            Some(0) | None => "/".to_string(),
            Some(pos) => normalized[..pos].to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_inode() {
        let table = InodeTable::new();
        assert_eq!(table.get_inode("/"), Some(InodeTable::ROOT_INODE));
        assert_eq!(table.get_path(InodeTable::ROOT_INODE), Some("/"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_get_or_create() {
        let mut table = InodeTable::new();

        let first = table.get_or_create("/root/a[1]");
        let again = table.get_or_create("/root/a[1]/");
        let other = table.get_or_create("/root/a[2]");

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_ne!(first, InodeTable::ROOT_INODE);
        assert_eq!(table.get_path(other), Some("/root/a[2]"));
    }

    #[test]
    fn test_inodes_are_never_reused() {
        let mut table = InodeTable::new();
        let inodes: Vec<u64> = ["/a", "/a/b", "/a/#contents"]
            .iter()
            .map(|p| table.get_or_create(p))
            .collect();
        assert_eq!(inodes, [2, 3, 4]);
        assert_eq!(table.get_or_create("/a"), 2);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(InodeTable::normalize_path(""), "/");
        assert_eq!(InodeTable::normalize_path("/"), "/");
        assert_eq!(InodeTable::normalize_path("//"), "/");
        assert_eq!(InodeTable::normalize_path("root"), "/root");
        assert_eq!(InodeTable::normalize_path("/root/"), "/root");
        assert_eq!(InodeTable::normalize_path("/root/a[2]"), "/root/a[2]");
    }

    #[test]
    fn test_child_path() {
        assert_eq!(InodeTable::child_path("/", "root"), "/root");
        assert_eq!(InodeTable::child_path("/", "#contents"), "/#contents");
        assert_eq!(InodeTable::child_path("/root", "a[2]"), "/root/a[2]");
        assert_eq!(InodeTable::child_path("/root/", "b"), "/root/b");
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(InodeTable::parent_path("/"), "/");
        assert_eq!(InodeTable::parent_path("/root"), "/");
        assert_eq!(InodeTable::parent_path("/root/a[2]"), "/root");
        assert_eq!(InodeTable::parent_path("/root/a[2]/#contents"), "/root/a[2]");
    }
}
