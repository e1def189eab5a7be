//! Core projection engine for xmlfs.
//!
//! Maps slash-delimited filesystem paths onto structural queries over a
//! loaded XML document and shapes query results into what a filesystem host
//! needs: attributes, file bytes, and directory listings.
//!
//! # Architecture
//!
//! - `path`: compiles a path such as `/root/item[2]/` into a [`StructuralQuery`]
//! - `document`: the [`DocumentStore`] capability and its roxmltree-backed
//!   [`XmlDocument`]
//! - `projector`: the [`Projector`], deriving attributes, listings and contents
//! - `dispatch`: the [`FilesystemOps`] contract a host (FUSE) calls into

pub mod attributes;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod path;
pub mod projector;

pub use attributes::{Attributes, EntryKind, FileTimes, FsStats};
pub use dispatch::FilesystemOps;
pub use document::{DocumentError, DocumentStore, NodeId, XmlDocument};
pub use error::ProjectionError;
pub use path::{compile, compile_listing, Segment, Step, StructuralPath, StructuralQuery};
pub use projector::{contents_owner, disambiguate, Projector, VirtualEntry, CONTENTS};
