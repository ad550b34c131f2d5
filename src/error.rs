//! Typed leaf errors: one `thiserror` enum per fallible boundary.
//! Nothing below the binary's `main.rs` uses `anyhow`/`color_eyre` — those
//! only wrap these at the outermost seam.
//!
//! The core itself never raises across its public boundary — these
//! variants exist for the collaborators (persistence, image resolution)
//! that sit outside the core and therefore may genuinely fail.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, #[source] source: std::io::Error },
    #[error("{path} is too large ({size} bytes; limit is {limit} bytes)")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum ImageResolveError {
    #[error("image path {0} escapes the document's base directory")]
    OutsideBaseDir(PathBuf),
    #[error("image {0} not found on disk")]
    NotFound(PathBuf),
}

impl From<PersistError> for std::io::Error {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::Read { source, .. } | PersistError::Write { source, .. } => source,
            PersistError::TooLarge { .. } => std::io::Error::other(err),
        }
    }
}
