//! Path normalization used by startup validation
//!
//! The destination and log file may not exist yet, so paths are resolved by
//! canonicalizing the longest existing prefix and appending the rest. `..`
//! is resolved lexically before anything else.

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` to an absolute path with symlinks in its existing prefix resolved
pub fn normalize(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        clean(path)
    } else {
        clean(&std::env::current_dir()?.join(path))
    };

    let mut existing = absolute.as_path();
    let mut tail: Vec<OsString> = Vec::new();
    loop {
        if let Ok(mut resolved) = existing.canonicalize() {
            for name in tail.iter().rev() {
                resolved.push(name);
            }
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute.clone()),
        }
    }
}

/// Remove `.` and resolve `..` lexically
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True when `child` equals `parent` or lies below it
pub fn is_within(child: &Path, parent: &Path) -> bool {
    child.starts_with(parent)
}
