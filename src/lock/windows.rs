//! Windows NT advisory locking via LockFileEx

use crate::error::{VientoError, VientoResult};
use crate::lock::platform::{LockMode, PlatformLock};
use fs2::FileExt;
use std::fs::File;
use std::io;

/// `ERROR_LOCK_VIOLATION` reported by LockFileEx under contention
const ERROR_LOCK_VIOLATION: i32 = 33;
/// `EDEADLOCK` reported by the C runtime's locking()
const EDEADLOCK: i32 = 36;
/// `ERROR_NOT_LOCKED` reported by UnlockFileEx
const ERROR_NOT_LOCKED: i32 = 158;
/// `EACCES` reported by the C runtime when unlocking without a lock
const EACCES: i32 = 13;

/// LockFileEx based locker for Windows NT kernels
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsLock;

impl PlatformLock for WindowsLock {
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
        "windows"
    }
}

fn normalize(err: io::Error) -> VientoError {
    match err.raw_os_error() {
        Some(ERROR_LOCK_VIOLATION) | Some(EDEADLOCK) => VientoError::LockWouldBlock,
        Some(ERROR_NOT_LOCKED) | Some(EACCES) => VientoError::LockNotHeld,
        _ if err.kind() == io::ErrorKind::WouldBlock => VientoError::LockWouldBlock,
        _ => VientoError::io("LockFileEx", err),
    }
}
