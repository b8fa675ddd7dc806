use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

use thiserror::Error;

use crate::process::SavedFd;

/// Permission bits for files created by `>`.
pub const OUTPUT_MODE: u32 = 0o640;

#[derive(Debug, Error)]
#[error("{path}: {source}")]
pub struct RedirectError {
    pub path: String,
    #[source]
    pub source: io::Error,
}

/// Open the target of `< path`: read-only, must already exist.
pub fn open_input(path: &str) -> Result<File, RedirectError> {
    File::open(path).map_err(|source| RedirectError {
        path: path.to_string(),
        source,
    })
}

/// Open the target of `> path`: created if missing, truncated otherwise.
pub fn open_output(path: &str) -> Result<File, RedirectError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(OUTPUT_MODE)
        .open(path)
        .map_err(|source| RedirectError {
            path: path.to_string(),
            source,
        })
}

/// Temporary redirection of the shell's own stdin/stdout for a builtin.
///
/// The original descriptors come back when the guard is dropped, whatever
/// the builtin did in between.
pub struct StdioGuard {
    // Restored in reverse order of installation.
    saved: Vec<SavedFd>,
}

impl StdioGuard {
    /// Install `< input` and `> output`. On failure nothing stays redirected.
    pub fn install(input: Option<&str>, output: Option<&str>) -> Result<Self, RedirectError> {
        let _ = io::stdout().flush();
        let mut guard = Self { saved: Vec::new() };

        if let Some(path) = input {
            let file = open_input(path)?;
            guard.replace(libc::STDIN_FILENO, &file, path)?;
        }
        if let Some(path) = output {
            let file = open_output(path)?;
            guard.replace(libc::STDOUT_FILENO, &file, path)?;
        }

        Ok(guard)
    }

    fn replace(&mut self, target: i32, file: &File, path: &str) -> Result<(), RedirectError> {
        let saved = SavedFd::replace(target, file.as_raw_fd()).map_err(|source| RedirectError {
            path: path.to_string(),
            source,
        })?;
        self.saved.push(saved);
        Ok(())
    }
}

impl Drop for StdioGuard {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
        while let Some(saved) = self.saved.pop() {
            drop(saved);
        }
    }
}
