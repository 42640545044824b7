//! Session-scoped working directory for extracted artifacts.
//!
//! Extracted images, header snapshots, and QR rasters accumulate here for
//! the lifetime of the process. Nothing reclaims the directory; eviction
//! is left to the host system's temp cleanup.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::Result;

static SESSION_DIR: OnceLock<PathBuf> = OnceLock::new();

/// The process-wide artifact directory, created on first use.
pub fn session_dir() -> Result<&'static Path> {
    if let Some(dir) = SESSION_DIR.get() {
        return Ok(dir.as_path());
    }

    let dir = std::env::temp_dir().join(format!("examforge-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    log::debug!("session artifact directory: {}", dir.display());

    // A racing first caller may have set it already; either value points at
    // an existing directory for this process.
    let _ = SESSION_DIR.set(dir);
    Ok(SESSION_DIR.get().expect("session dir initialized").as_path())
}

/// Resolve the artifact directory: an explicit override or the session one.
pub fn resolve_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok(dir.to_path_buf())
        }
        None => Ok(session_dir()?.to_path_buf()),
    }
}
