//! Error types for link resolution and selection

use std::path::PathBuf;

/// Errors surfaced by interactive link commands.
///
/// These abort only the command that raised them; cache and pipeline
/// state stay intact. Background decoration failures are logged and
/// skipped instead of raised.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Page {page} is not displayed")]
    PageNotReady { page: usize },

    #[error("No links on page {page}")]
    NoLinksOnPage { page: usize },

    #[error("Link has no destination")]
    BrokenTarget,

    #[error("Link to nonexistent file '{}'", file.display())]
    MissingFile { file: PathBuf },

    #[error("Invalid link action kind: {kind}")]
    InvalidActionKind { kind: String },

    #[error("Launching external programs from links is disabled")]
    LaunchDisabled,

    #[error("Link provider: {detail}")]
    Provider { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LinkError {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider { detail: msg.into() }
    }
}
