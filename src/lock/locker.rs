//! Lock acquisition with bounded blocking retry
//!
//! `Locker` pairs a resolved [`PlatformLock`] with a [`RetryPolicy`] and
//! hands out [`LockGuard`]s. The blocking path sleeps the calling thread
//! between attempts, the async path yields to the runtime instead. Both
//! follow the same schedule and produce the same outcomes.

use crate::error::{VientoError, VientoResult};
use crate::lock::backoff::RetryPolicy;
use crate::lock::guard::LockGuard;
use crate::lock::platform::{native_platform_lock, LockMode, PlatformLock};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Acquires advisory locks on files
#[derive(Clone)]
pub struct Locker {
    platform: Arc<dyn PlatformLock>,
    policy: RetryPolicy,
}

impl Locker {
    /// Create a locker around a resolved platform lock
    pub fn new(platform: Arc<dyn PlatformLock>, policy: RetryPolicy) -> Self {
        Self { platform, policy }
    }

    /// Create a locker for the host kernel with the default policy
    pub fn native() -> VientoResult<Self> {
        let platform: Arc<dyn PlatformLock> = Arc::from(native_platform_lock()?);
        Ok(Self::new(platform, RetryPolicy::default()))
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The retry policy used for blocking acquisition
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Backend name of the underlying platform lock
    pub fn backend_name(&self) -> &'static str {
        self.platform.name()
    }

    /// Lock `file`, suspending the current thread between attempts
    ///
    /// With `blocking = false` a single attempt is made and contention
    /// surfaces as `LockWouldBlock` without sleeping. Errors other than
    /// contention are never retried.
    pub fn acquire(&self, file: File, mode: LockMode, blocking: bool) -> VientoResult<LockGuard> {
        let mut backoff = self.policy.backoff();
        loop {
            if self.attempt(&file, mode, blocking)? {
                return Ok(LockGuard::new(file, mode, self.platform.clone()));
            }
            match backoff.next() {
                Some(wait) => {
                    debug!("{} lock contended, retrying in {:?}", mode, wait);
                    std::thread::sleep(wait);
                }
                None => return Err(self.exhausted(mode, backoff.slept_units())),
            }
        }
    }

    /// Lock `file`, yielding to the async runtime between attempts
    ///
    /// Each attempt is synchronous and bounded; the only await point is the
    /// backoff sleep. Dropping the future while it sleeps leaves no lock
    /// behind. Dropping the returned guard releases the lock.
    pub async fn acquire_async(
        &self,
        file: File,
        mode: LockMode,
        blocking: bool,
    ) -> VientoResult<LockGuard> {
        let mut backoff = self.policy.backoff();
        loop {
            if self.attempt(&file, mode, blocking)? {
                return Ok(LockGuard::new(file, mode, self.platform.clone()));
            }
            match backoff.next() {
                Some(wait) => {
                    debug!("{} lock contended, yielding for {:?}", mode, wait);
                    tokio::time::sleep(wait).await;
                }
                None => return Err(self.exhausted(mode, backoff.slept_units())),
            }
        }
    }

    /// Release a held lock, reporting unlock failures
    pub fn release(&self, guard: LockGuard) -> VientoResult<()> {
        guard.release()
    }

    /// One attempt: `Ok(true)` when granted, `Ok(false)` when the caller
    /// should back off and retry.
    fn attempt(&self, file: &File, mode: LockMode, blocking: bool) -> VientoResult<bool> {
        match self.platform.try_lock(file, mode) {
            Ok(()) => {
                debug!("Acquired {} lock via {}", mode, self.platform.name());
                Ok(true)
            }
            Err(VientoError::LockWouldBlock) if blocking => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn exhausted(&self, mode: LockMode, slept_units: u32) -> VientoError {
        let waited = self.policy.unit.saturating_mul(slept_units);
        warn!(
            "Gave up on {} lock after waiting {:?} (budget {} units)",
            mode, waited, self.policy.budget
        );
        VientoError::LockWouldBlock
    }
}

impl std::fmt::Debug for Locker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locker")
            .field("backend", &self.platform.name())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Total time a blocking acquisition may sleep under `policy`
pub fn max_wait(policy: &RetryPolicy) -> Duration {
    policy.backoff().sum()
}
