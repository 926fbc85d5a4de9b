//! Advisory file locking
//!
//! Platform-agnostic shared/exclusive locks on whole files:
//! - POSIX kernels: flock(2)
//! - Windows NT kernels: LockFileEx
//!
//! Acquisition is either a single non-blocking attempt or a bounded retry
//! loop (see [`RetryPolicy`]). Every granted lock is a [`LockGuard`] that
//! releases exactly once on every exit path.

mod backoff;
mod guard;
mod locker;
mod platform;
#[cfg(unix)]
mod posix;
#[cfg(test)]
pub(crate) mod testing;
#[cfg(windows)]
mod windows;

pub use backoff::{Backoff, RetryPolicy, DEFAULT_RETRY_UNIT, DEFAULT_WAIT_BUDGET};
pub use guard::LockGuard;
pub use locker::{max_wait, Locker};
pub use platform::{
    native_platform_lock, platform_lock_for, HostKernel, LockMode, PlatformLock,
};
#[cfg(unix)]
pub use posix::PosixLock;
#[cfg(windows)]
pub use windows::WindowsLock;
