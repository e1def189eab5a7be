//! Loading the backing document at startup.

use std::path::{Path, PathBuf};

use common::{DocumentError, FileTimes, Projector, XmlDocument};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to load {path}: {source}")]
    Document {
        path: PathBuf,
        source: DocumentError,
    },
}

/// Read, stat and parse `path` into a ready projector.
///
/// The text is kept verbatim so the root `#contents` file reproduces the
/// file byte for byte; timestamps are captured once here and reported for
/// every entry.
pub fn load(path: &Path) -> Result<Projector<XmlDocument>, LoadError> {
    let read_err = |source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(read_err)?;
    let source = std::fs::read_to_string(path).map_err(read_err)?;
    let times = FileTimes::from_metadata(&metadata);

    let document = XmlDocument::parse(source).map_err(|source| LoadError::Document {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        elements = document.element_count(),
        bytes = document.as_str().len(),
        "loaded document"
    );

    Ok(Projector::new(document, times))
}
