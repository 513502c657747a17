//! Persisted session cookie
//!
//! The API authenticates with an HTTP cookie. A CLI process lives for one
//! command, so the cookie header is kept in a small file between runs.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// File-backed storage for the session `Cookie` header value
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by the given file (created lazily on save).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved cookie header, if any.
    ///
    /// A missing or empty file means "no session".
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Session` if the file exists but cannot be read.
    pub fn load(&self) -> ApiResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    Ok(None)
                } else {
                    debug!("Loaded session from {}", self.path.display());
                    Ok(Some(contents.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.error(e)),
        }
    }

    /// Save a cookie header, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Session` if the directory or file cannot be written.
    pub fn save(&self, cookie_header: &str) -> ApiResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        write_private(&self.path, cookie_header).map_err(|e| self.error(e))?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    /// Remove the saved session. Removing a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Session` if the file exists but cannot be removed.
    pub fn clear(&self) -> ApiResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Cleared session at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error(e)),
        }
    }

    fn error(&self, source: std::io::Error) -> ApiError {
        ApiError::Session {
            path: self.path.clone(),
            source,
        }
    }
}

/// Write `contents` readable by the owner only. The cookie is a credential.
#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::fs::{OpenOptions, Permissions};
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten a file left by an older save
    file.set_permissions(Permissions::from_mode(0o600))?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}
