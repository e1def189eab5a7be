//! Operations a filesystem host calls into, keyed by projection path.

use std::borrow::Cow;

use tracing::debug;

use crate::attributes::{Attributes, FsStats};
use crate::document::DocumentStore;
use crate::error::ProjectionError;
use crate::projector::Projector;

/// The read-only filesystem contract.
///
/// Paths are root-relative and slash-delimited (`/root/a[2]/#contents`).
/// Every call is independent; implementations hold no per-request state.
pub trait FilesystemOps: Send + Sync {
    /// Attributes of `path`, or `NotFound` when it names nothing
    fn get_attributes(&self, path: &str) -> Result<Attributes, ProjectionError>;

    /// A fresh handle for `path`. Never fails; flags are ignored.
    fn open(&self, path: &str, flags: i32) -> u64;

    /// Up to `size` bytes of a contents file starting at `offset`
    fn read(
        &self,
        path: &str,
        size: usize,
        offset: u64,
        handle: u64,
    ) -> Result<Cow<'_, [u8]>, ProjectionError>;

    /// Entry names of a directory, fixed entries first
    fn list_directory(&self, path: &str, handle: u64) -> Vec<String>;

    fn filesystem_stats(&self, path: &str) -> FsStats;
}

impl<D: DocumentStore> FilesystemOps for Projector<D> {
    fn get_attributes(&self, path: &str) -> Result<Attributes, ProjectionError> {
        self.resolve_attributes(path)
    }

    fn open(&self, path: &str, flags: i32) -> u64 {
        let handle = self.next_handle();
        debug!(path, flags, handle, "open");
        handle
    }

    fn read(
        &self,
        path: &str,
        size: usize,
        offset: u64,
        _handle: u64,
    ) -> Result<Cow<'_, [u8]>, ProjectionError> {
        Projector::read(self, path, size, offset)
    }

    fn list_directory(&self, path: &str, _handle: u64) -> Vec<String> {
        self.list(path)
            .iter()
            .map(|entry| entry.name().into_owned())
            .collect()
    }

    fn filesystem_stats(&self, _path: &str) -> FsStats {
        FsStats::default()
    }
}
