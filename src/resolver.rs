//! Link action descriptions and execution

use std::path::Path;

use log::debug;

use crate::error::LinkError;
use crate::host::{Navigator, UriHandler};
use crate::types::{Action, Link};

/// Human-readable description of a link. Deterministic and side-effect
/// free; safe to call while building region labels.
#[must_use]
pub fn describe(link: &Link) -> String {
    let mut desc = match &link.action {
        Action::GotoDest { page, .. } => {
            if *page > 0 {
                format!("Goto page {page}")
            } else {
                "Destination not found".to_string()
            }
        }

        Action::GotoRemote { file, page, .. } => {
            if file.exists() {
                if *page > 0 {
                    format!("Goto p. {page} of file '{}'", file.display())
                } else {
                    format!("Goto file '{}'", file.display())
                }
            } else {
                format!("Link to nonexistent file '{}'", file.display())
            }
        }

        Action::Launch { program, args } => {
            if is_executable(program) {
                format!(
                    "Launch '{}' with arguments '{args}'",
                    program.display()
                )
            } else {
                format!("Link to nonexecutable program '{}'", program.display())
            }
        }

        Action::Uri { uri } => {
            if uri.is_empty() {
                "Link to empty uri".to_string()
            } else {
                format!("Link to uri '{uri}'")
            }
        }
    };

    if let Some(title) = &link.title {
        desc.push_str(&format!(" ({title})"));
    }

    desc
}

/// Execute a link action against the viewer.
///
/// `Launch` is deliberately not executed: running arbitrary programs
/// named by document content is a security hole, so it only exists as a
/// description path and fails here with `LaunchDisabled`.
pub fn execute(
    action: &Action,
    navigator: &mut dyn Navigator,
    uri_handler: &dyn UriHandler,
) -> Result<(), LinkError> {
    match action {
        Action::GotoDest { page, top } => {
            if *page == 0 {
                return Err(LinkError::BrokenTarget);
            }
            debug!("Following link to page {page}");
            navigator.goto_page(*page, Some(*top));
            Ok(())
        }

        Action::GotoRemote { file, page, top } => {
            if !file.exists() {
                return Err(LinkError::MissingFile { file: file.clone() });
            }
            debug!("Following link to remote file {}", file.display());
            let can_navigate = navigator.open_document(file)?;
            if can_navigate && *page > 0 {
                navigator.goto_page(*page, Some(*top));
            }
            Ok(())
        }

        Action::Uri { uri } => {
            debug!("Handing link uri to handler: {uri}");
            uri_handler.handle(uri)
        }

        Action::Launch { .. } => Err(LinkError::LaunchDisabled),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
