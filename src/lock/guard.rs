//! Scoped lock handle
//!
//! A `LockGuard` owns the locked file and the backend that locked it.
//! Release happens exactly once: either through [`LockGuard::release`],
//! which reports unlock failures, or on drop, which logs them. Drop also
//! covers early returns, panics and futures cancelled after acquisition.

use crate::error::VientoResult;
use crate::lock::platform::{LockMode, PlatformLock};
use std::fs::File;
use std::sync::Arc;
use tracing::{debug, warn};

/// A held advisory lock on a file
pub struct LockGuard {
    file: File,
    mode: LockMode,
    platform: Arc<dyn PlatformLock>,
    released: bool,
}

impl LockGuard {
    pub(crate) fn new(file: File, mode: LockMode, platform: Arc<dyn PlatformLock>) -> Self {
        Self {
            file,
            mode,
            platform,
            released: false,
        }
    }

    /// Mode this lock was granted in
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// The locked file
    ///
    /// `&File` implements `Read`, `Write` and `Seek`, so all I/O on the
    /// protected resource goes through this handle.
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Release the lock now and report any unlock failure
    pub fn release(mut self) -> VientoResult<()> {
        self.released = true;
        debug!("Releasing {} {} lock", self.platform.name(), self.mode);
        self.platform.unlock(&self.file)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        debug!("Releasing {} {} lock on drop", self.platform.name(), self.mode);
        if let Err(e) = self.platform.unlock(&self.file) {
            warn!("Failed to release {} lock: {}", self.mode, e);
        }
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("mode", &self.mode)
            .field("backend", &self.platform.name())
            .field("released", &self.released)
            .finish()
    }
}
