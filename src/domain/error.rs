//! Error taxonomy of the acquisition core.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrabError {
    /// The metadata file has no identifier field, so it is not a media NFO.
    #[error("Metadata file {path} has no <{field}> field")]
    UnsupportedMetadata { path: PathBuf, field: String },

    /// Best-match selection was asked to pick from nothing.
    #[error("Cannot select a best match from an empty candidate set")]
    EmptyCandidateSet,

    /// A multi-file candidate was selected while multi-file support is off.
    #[error("Unexpected format: candidate {id} is split across {files} files")]
    UnsupportedFormat { id: String, files: usize },

    /// The catalog reported a successful download but nothing was written.
    #[error("Download reported success but {path} was not written")]
    DownloadVerificationFailed { path: PathBuf },

    /// Failure inside an external collaborator (network, IO, parsing).
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}
