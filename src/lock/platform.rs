//! Platform lock abstraction
//!
//! Provides a trait for advisory file locking that is implemented once per
//! kernel family (flock on POSIX, LockFileEx on Windows NT). The host kernel
//! is detected once and every call site depends only on the trait.

use crate::error::{VientoError, VientoResult};
use std::fmt;
use std::fs::File;

/// Lock mode requested by the caller
///
/// Chosen from the caller's declared intent: readers ask for `Shared`,
/// writers for `Exclusive`. The mode the file was opened with plays no part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Any number of holders, excludes exclusive holders
    Shared,
    /// Single holder, excludes everyone else
    Exclusive,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// Advisory lock primitive for one kernel family
///
/// Implementations perform a single, non-blocking attempt per call. Blocking
/// behaviour and backoff live in [`Locker`](super::Locker) so that they are
/// identical across platforms and across the sync and async call paths.
///
/// Errors must already be normalized: contention is reported as
/// [`VientoError::LockWouldBlock`], unlocking something not held as
/// [`VientoError::LockNotHeld`].
pub trait PlatformLock: Send + Sync {
    /// Try once to lock the whole file in the given mode
    fn try_lock(&self, file: &File, mode: LockMode) -> VientoResult<()>;

    /// Release whatever lock this descriptor holds on the file
    fn unlock(&self, file: &File) -> VientoResult<()>;

    /// Human-readable backend name for logs
    fn name(&self) -> &'static str;
}

/// Detected host kernel family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKernel {
    /// Linux, macOS, the BSDs
    Posix,
    /// Windows NT family
    WindowsNt,
    /// Anything else
    Unsupported,
}

impl HostKernel {
    /// Detect the kernel family this binary was built for
    pub fn detect() -> Self {
        if cfg!(unix) {
            HostKernel::Posix
        } else if cfg!(windows) {
            HostKernel::WindowsNt
        } else {
            HostKernel::Unsupported
        }
    }

    /// Get a human-readable kernel name
    pub fn name(&self) -> &'static str {
        match self {
            HostKernel::Posix => "POSIX",
            HostKernel::WindowsNt => "Windows NT",
            HostKernel::Unsupported => "Unsupported",
        }
    }
}

/// Create the platform lock for a kernel family
///
/// # Returns
/// * `Ok(Box<dyn PlatformLock>)` - The variant for `kernel`
/// * `Err(UnsupportedPlatform)` - If no variant exists for `kernel` on this build
pub fn platform_lock_for(kernel: HostKernel) -> VientoResult<Box<dyn PlatformLock>> {
    match kernel {
        HostKernel::Posix => posix_lock(),
        HostKernel::WindowsNt => windows_lock(),
        HostKernel::Unsupported => Err(VientoError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        )),
    }
}

/// Create the platform lock for the host kernel
pub fn native_platform_lock() -> VientoResult<Box<dyn PlatformLock>> {
    platform_lock_for(HostKernel::detect())
}

#[cfg(unix)]
fn posix_lock() -> VientoResult<Box<dyn PlatformLock>> {
    Ok(Box::new(super::posix::PosixLock))
}

#[cfg(not(unix))]
fn posix_lock() -> VientoResult<Box<dyn PlatformLock>> {
    Err(VientoError::UnsupportedPlatform(format!(
        "POSIX locking is not available on {}",
        std::env::consts::OS
    )))
}

#[cfg(windows)]
fn windows_lock() -> VientoResult<Box<dyn PlatformLock>> {
    Ok(Box::new(super::windows::WindowsLock))
}

#[cfg(not(windows))]
fn windows_lock() -> VientoResult<Box<dyn PlatformLock>> {
    Err(VientoError::UnsupportedPlatform(format!(
        "Windows NT locking is not available on {}",
        std::env::consts::OS
    )))
}
