//! Local <-> remote path translation
//!
//! Both directions use the same relative-path algebra: strip the root on one side,
//! join the remainder onto the root on the other side. Containment is a literal
//! string-prefix test against the configured root; paths are cleaned lexically
//! (`.`/`..`/duplicate separators) but never canonicalised against the filesystem.
//!
//! Remote paths are always `/`-separated regardless of the host platform.

use std::path::{Component, Path, PathBuf};

use crate::configure::ProjectConfig;
use crate::models::TransferError;

/// A resolved (local, remote) pair for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub local_path: PathBuf,
    pub remote_path: String,
}

/// True when `local_path` has the project's local root as a literal prefix.
pub fn is_within_root(project: &ProjectConfig, local_path: &str) -> bool {
    strip_root(local_path, &project.local_base_path).is_ok()
}

/// Map a local path onto the project's remote root.
pub fn to_remote(project: &ProjectConfig, local_path: &str) -> Result<String, TransferError> {
    let relative = strip_root(local_path, &project.local_base_path)?;
    Ok(join_remote(&project.sftp_base_path, relative))
}

/// Map a remote path back onto the project's local root.
///
/// Both the path and the configured root are cleaned first, so this is the exact
/// inverse of [`to_remote`] even for roots such as `.`, `./uploads` or `/srv//demo`.
pub fn to_local(project: &ProjectConfig, remote_path: &str) -> Result<PathBuf, TransferError> {
    let root = clean_remote(&project.sftp_base_path);
    let path = clean_remote(remote_path);
    let relative = if root == "." {
        // Session home directory: everything relative that does not climb out of it
        if path.starts_with('/') || path == ".." || path.starts_with("../") {
            return Err(TransferError::OutOfScope {
                path,
                root: project.sftp_base_path.clone(),
            });
        }
        if path == "." {
            ""
        } else {
            path.as_str()
        }
    } else {
        strip_root(&path, &root)?
    };
    Ok(join_local(Path::new(&project.local_base_path), relative))
}

pub fn resolve_target(
    project: &ProjectConfig,
    local_path: &str,
) -> Result<TransferTarget, TransferError> {
    Ok(TransferTarget {
        local_path: PathBuf::from(local_path),
        remote_path: to_remote(project, local_path)?,
    })
}

/// Parent directory of a remote path (`/` for top-level entries).
pub fn remote_parent(remote_path: &str) -> String {
    match remote_path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => remote_path[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// Join a child name onto a remote directory.
pub fn remote_child(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

fn strip_root<'a>(path: &'a str, root: &str) -> Result<&'a str, TransferError> {
    let trimmed = root.trim_end_matches(is_separator);
    let prefix = if trimmed.is_empty() { root } else { trimmed };
    let rest = path
        .strip_prefix(prefix)
        .ok_or_else(|| TransferError::OutOfScope {
            path: path.to_string(),
            root: root.to_string(),
        })?;
    Ok(rest.trim_start_matches(is_separator))
}

fn is_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

fn join_remote(root: &str, relative: &str) -> String {
    let normalized = relative.replace('\\', "/");
    if normalized.is_empty() {
        clean_remote(root)
    } else {
        clean_remote(&format!("{}/{}", root, normalized))
    }
}

fn join_local(root: &Path, relative: &str) -> PathBuf {
    let mut joined = PathBuf::new();
    for component in root.join(relative).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !joined.pop() {
                    joined.push(component.as_os_str());
                }
            }
            other => joined.push(other.as_os_str()),
        }
    }
    joined
}

/// Lexically clean a `/`-separated path: collapse separators, drop `.`,
/// resolve `..` against preceding segments.
pub fn clean_remote(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let body = segments.join("/");
    match (absolute, body.is_empty()) {
        (true, _) => format!("/{body}"),
        (false, true) => ".".to_string(),
        (false, false) => body,
    }
}
