//! Path-to-structure projection.
//!
//! Every element becomes a directory. Each directory holds one
//! subdirectory per child element plus a `#contents` file carrying the
//! element's serialized text:
//!
//! ```text
//! <root><a/><b/><a/></root>
//!
//! /
//! ├── #contents          the document, byte for byte
//! └── root/
//!     ├── #contents      <root><a/><b/><a/></root>
//!     ├── a[1]/
//!     ├── b/
//!     └── a[2]/
//! ```
//!
//! Siblings sharing a tag are told apart by a 1-based occurrence suffix; a
//! tag that occurs once keeps its bare name. Suffixes use the same numbering
//! as path indices, so every listed name resolves back to its own node.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::attributes::{Attributes, EntryKind, FileTimes};
use crate::document::DocumentStore;
use crate::error::ProjectionError;
use crate::path::{compile, compile_listing, SEPARATOR};

/// Name of the file exposing a node's serialized text
pub const CONTENTS: &str = "#contents";

/// One entry of a synthesized directory listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VirtualEntry {
    /// `.`
    Current,
    /// `..`
    Parent,
    /// `#contents`
    Contents,
    /// A child element, suffixed with its occurrence when its tag repeats
    Child {
        tag: String,
        occurrence: Option<usize>,
    },
}

impl VirtualEntry {
    /// Leading entries of every listing
    pub const FIXED: [VirtualEntry; 3] = [
        VirtualEntry::Current,
        VirtualEntry::Parent,
        VirtualEntry::Contents,
    ];

    pub fn name(&self) -> Cow<'_, str> {
        match self {
            VirtualEntry::Current => Cow::Borrowed("."),
            VirtualEntry::Parent => Cow::Borrowed(".."),
            VirtualEntry::Contents => Cow::Borrowed(CONTENTS),
            VirtualEntry::Child {
                tag,
                occurrence: None,
            } => Cow::Borrowed(tag.as_str()),
            VirtualEntry::Child {
                tag,
                occurrence: Some(n),
            } => Cow::Owned(format!("{}[{}]", tag, n)),
        }
    }

    /// Kind of a listed name, without resolving it
    pub fn kind_of(name: &str) -> EntryKind {
        if name == CONTENTS {
            EntryKind::File
        } else {
            EntryKind::Directory
        }
    }
}

impl fmt::Display for VirtualEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Name sibling elements, suffixing tags that occur more than once.
///
/// Entries keep the order of `tags`; the i-th occurrence of a repeated tag
/// becomes `tag[i]`.
pub fn disambiguate<'a, I>(tags: I) -> Vec<VirtualEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let tags: Vec<&str> = tags.into_iter().collect();

    let mut totals: HashMap<&str, usize> = HashMap::new();
    for &tag in &tags {
        *totals.entry(tag).or_default() += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    tags.iter()
        .map(|&tag| {
            let occurrence = if totals[tag] > 1 {
                let n = seen.entry(tag).or_default();
                *n += 1;
                Some(*n)
            } else {
                None
            };
            VirtualEntry::Child {
                tag: tag.to_string(),
                occurrence,
            }
        })
        .collect()
}

/// Split a contents path into the path of the node it belongs to.
///
/// `/a/b/#contents` → `Some("/a/b")`, `/#contents` → `Some("")`.
pub fn contents_owner(path: &str) -> Option<&str> {
    path.strip_suffix(CONTENTS)?.strip_suffix(SEPARATOR)
}

fn is_root(path: &str) -> bool {
    path.trim_matches(SEPARATOR).is_empty()
}

/// Clip `content` to at most `size` bytes starting at `offset`.
fn byte_range(content: Cow<'_, [u8]>, size: usize, offset: u64) -> Cow<'_, [u8]> {
    let len = content.len();
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(len);
    let end = start.saturating_add(size).min(len);
    match content {
        Cow::Borrowed(bytes) => Cow::Borrowed(&bytes[start..end]),
        Cow::Owned(mut bytes) => {
            bytes.truncate(end);
            bytes.drain(..start);
            Cow::Owned(bytes)
        }
    }
}

/// Projects a document store onto a read-only directory tree.
///
/// Holds the document for its whole lifetime and keeps no per-request state
/// besides the open-handle counter.
pub struct Projector<D> {
    store: D,
    times: FileTimes,
    next_handle: AtomicU64,
}

impl<D> fmt::Debug for Projector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("times", &self.times)
            .field("next_handle", &self.next_handle)
            .finish_non_exhaustive()
    }
}

impl<D: DocumentStore> Projector<D> {
    pub fn new(store: D, times: FileTimes) -> Self {
        Self {
            store,
            times,
            next_handle: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    pub fn times(&self) -> FileTimes {
        self.times
    }

    /// Attributes of a node directory or a contents file.
    pub fn resolve_attributes(&self, path: &str) -> Result<Attributes, ProjectionError> {
        if let Some(owner) = contents_owner(path) {
            let size = self.contents(owner)?.len() as u64;
            return Ok(Attributes::file(size, self.times));
        }

        let query = compile(path);
        trace!(path, %query, "resolving attributes");
        if self.store.evaluate(&query).is_empty() {
            return Err(ProjectionError::not_found(path));
        }

        Ok(Attributes::directory(
            self.child_entries(path).len(),
            self.times,
        ))
    }

    /// Full listing of a path: `.`, `..`, `#contents`, then its children.
    ///
    /// A path naming nothing lists only the fixed entries.
    pub fn list(&self, path: &str) -> Vec<VirtualEntry> {
        let mut entries = VirtualEntry::FIXED.to_vec();
        entries.extend(self.child_entries(path));
        entries
    }

    /// Up to `size` bytes of a contents file, starting at `offset`.
    pub fn read(&self, path: &str, size: usize, offset: u64) -> Result<Cow<'_, [u8]>, ProjectionError> {
        let owner = contents_owner(path).ok_or_else(|| ProjectionError::not_found(path))?;
        let content = self.contents(owner)?;
        Ok(byte_range(content, size, offset))
    }

    /// A fresh handle; handles carry no state.
    pub fn next_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Serialized text of the node at `owner`, or the whole original
    /// document for the root.
    fn contents(&self, owner: &str) -> Result<Cow<'_, [u8]>, ProjectionError> {
        if is_root(owner) {
            return Ok(Cow::Borrowed(self.store.source()));
        }

        let query = compile(owner);
        trace!(path = owner, %query, "reading contents");
        let node = self
            .store
            .evaluate(&query)
            .first()
            .copied()
            .ok_or_else(|| ProjectionError::not_found(owner))?;
        Ok(self.store.serialize(node))
    }

    fn child_entries(&self, path: &str) -> Vec<VirtualEntry> {
        let query = compile_listing(path);
        trace!(path, %query, "listing children");
        let children = self.store.evaluate(&query);
        disambiguate(children.into_iter().map(|node| self.store.tag_name(node)))
    }
}
