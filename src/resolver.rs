use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Directories probed, in order, for a bare program name.
pub const SEARCH_DIRS: &[&str] = &["/usr/local/bin", "/usr/bin", "/bin"];

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("{0}: command not found")]
    NotFound(String),
}

/// Locate the executable for `name`.
///
/// A name containing `/` is used as-is; whether it exists is left to exec.
pub fn resolve(name: &str) -> Result<PathBuf, ResolveError> {
    resolve_in(name, SEARCH_DIRS)
}

/// [`resolve`] against an explicit directory list.
pub fn resolve_in<P: AsRef<Path>>(name: &str, dirs: &[P]) -> Result<PathBuf, ResolveError> {
    if name.contains('/') {
        return Ok(PathBuf::from(name));
    }

    find_in_dirs(name, dirs).ok_or_else(|| ResolveError::NotFound(name.to_string()))
}

/// First `dir/name` that passes an executable-access check.
pub fn find_in_dirs<P: AsRef<Path>>(name: &str, dirs: &[P]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.as_ref().join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}
