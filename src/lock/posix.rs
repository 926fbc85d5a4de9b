//! POSIX advisory locking via flock(2)

use crate::error::{VientoError, VientoResult};
use crate::lock::platform::{LockMode, PlatformLock};
use fs2::FileExt;
use std::fs::File;
use std::io;

/// flock(2) based locker for POSIX kernels
///
/// Locks belong to the open file description, so two handles opened
/// separately on the same path contend with each other even inside a
/// single process.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixLock;

impl PlatformLock for PosixLock {
    fn try_lock(&self, file: &File, mode: LockMode) -> VientoResult<()> {
        let result = match mode {
            LockMode::Shared => FileExt::try_lock_shared(file),
            LockMode::Exclusive => FileExt::try_lock_exclusive(file),
        };
        result.map_err(normalize)
    }

    fn unlock(&self, file: &File) -> VientoResult<()> {
        FileExt::unlock(file).map_err(normalize)
    }

    fn name(&self) -> &'static str {
        "posix"
    }
}

/// Map flock errors onto the lock error taxonomy
///
/// std classifies EWOULDBLOCK/EAGAIN as `WouldBlock` and EPERM as
/// `PermissionDenied`. An interrupted attempt is retried like contention.
fn normalize(err: io::Error) -> VientoError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => VientoError::LockWouldBlock,
        io::ErrorKind::PermissionDenied => VientoError::LockNotHeld,
        _ => VientoError::io("flock", err),
    }
}
