//! Sandbox path resolution
//!
//! Every path a tool touches goes through [`Sandbox::resolve`] first. The
//! candidate is normalized with all symlinks followed, then checked to be the
//! sandbox root or a descendant of it. Nothing else on disk is touched until
//! that check passes.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

use fsagent_config::expand_tilde;

/// Symlink hops followed before a path is declared a loop
pub const MAX_SYMLINK_HOPS: usize = 40;

/// Sandbox violations
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("PATH OUT OF BOUNDS: {} is outside {}", .path.display(), .root.display())]
    OutOfBounds { path: PathBuf, root: PathBuf },

    #[error("SYMLINK LOOP: {}", .path.display())]
    SymlinkLoop { path: PathBuf },

    #[error("INVALID SANDBOX ROOT {}: {source}", .root.display())]
    InvalidRoot {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A fixed directory that tool paths are confined to
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Canonicalize `root` and require it to be an existing directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root).map_err(|source| SandboxError::InvalidRoot {
            root: root.to_path_buf(),
            source,
        })?;
        if !canonical.is_dir() {
            return Err(SandboxError::InvalidRoot {
                root: canonical,
                source: io::Error::new(io::ErrorKind::Other, "not a directory"),
            });
        }
        debug!("◆ SANDBOX ROOT: {:?}", canonical);
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a tool-supplied path to an absolute path inside the root.
    ///
    /// `~` expands to the home directory; relative paths are taken against
    /// the root. Paths that do not exist yet resolve lexically below their
    /// deepest existing ancestor.
    pub async fn resolve(&self, path: &str) -> Result<PathBuf, SandboxError> {
        let expanded = expand_tilde(path);
        let candidate = if expanded.is_absolute() {
            expanded
        } else {
            self.root.join(expanded)
        };

        let normalized = normalize(&candidate).await?;
        if !is_path_within_root(&normalized, &self.root) {
            debug!("◆ REJECTED {:?} -> {:?}", path, normalized);
            return Err(SandboxError::OutOfBounds {
                path: normalized,
                root: self.root.clone(),
            });
        }

        trace!("Resolved {:?} -> {:?}", path, normalized);
        Ok(normalized)
    }
}

/// Resolve `.`, `..` and symlinks component by component.
///
/// Components that do not exist are kept as written. A symlink's target is
/// spliced back into the queue, so targets containing `..` or further links
/// are handled the same way as the original path.
async fn normalize(path: &Path) -> Result<PathBuf, SandboxError> {
    let mut resolved = PathBuf::new();
    let mut pending: VecDeque<OsString> = VecDeque::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            other => pending.push_back(other.as_os_str().to_os_string()),
        }
    }

    let mut hops = 0;
    while let Some(part) = pending.pop_front() {
        if part == "." {
            continue;
        }
        if part == ".." {
            resolved.pop();
            continue;
        }

        let candidate = resolved.join(&part);
        let is_link = tokio::fs::symlink_metadata(&candidate)
            .await
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);
        if !is_link {
            resolved = candidate;
            continue;
        }

        hops += 1;
        if hops > MAX_SYMLINK_HOPS {
            return Err(SandboxError::SymlinkLoop { path: candidate });
        }
        let target = match tokio::fs::read_link(&candidate).await {
            Ok(target) => target,
            Err(_) => {
                resolved = candidate;
                continue;
            }
        };
        trace!("Following link {:?} -> {:?}", candidate, target);

        if target.has_root() {
            resolved = target
                .components()
                .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
                .collect();
        }
        for component in target.components().rev() {
            match component {
                Component::Prefix(_) | Component::RootDir => {}
                other => pending.push_front(other.as_os_str().to_os_string()),
            }
        }
    }

    Ok(resolved)
}

/// Component-wise prefix check, so `/work2` is not inside `/work`
fn is_path_within_root(path: &Path, root: &Path) -> bool {
    let mut path_components = path.components();
    root.components()
        .all(|root_comp| path_components.next() == Some(root_comp))
}
