//! Runtime errors surfaced by the projector.

/// The only failure a projection call can produce: the path names no node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    #[error("no node at {path}")]
    NotFound { path: String },
}

impl ProjectionError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }
}
