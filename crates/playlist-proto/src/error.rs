use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a run.
///
/// A missing `Artist` or `Title` in the feed is not an error: the value is
/// replaced by a visible marker so the page still renders.
#[derive(Error, Debug)]
pub enum PlaylistError {
    /// Feed file absent, unreadable, or not the expected XML shape.
    #[error("source feed {path:?} unavailable: {reason}")]
    MissingSource { path: PathBuf, reason: String },

    /// The remembered-pair file or the history log cannot be opened read-write.
    #[error("storage {path:?} unavailable: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template cannot be read or its output cannot be written.
    #[error("template I/O failed for {path:?}: {source}")]
    TemplateUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PlaylistError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn template(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TemplateUnavailable {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlaylistError>;
