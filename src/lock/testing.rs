//! In-memory platform lock for tests
//!
//! Models a single resource: every handle passed in is treated as the same
//! file, so two acquisitions through one `MemoryLock` contend.

use crate::error::{VientoError, VientoResult};
use crate::lock::platform::{LockMode, PlatformLock};
use std::fs::File;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    exclusive: bool,
    shared: usize,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryLock {
    state: Mutex<State>,
    attempts: AtomicUsize,
    unlocks: AtomicUsize,
    /// Attempts that report contention before the real state is consulted
    contended_for: usize,
    /// Every attempt fails with `LockNotHeld`
    failing: bool,
}

impl MemoryLock {
    pub(crate) fn contended(attempts: usize) -> Self {
        Self {
            contended_for: attempts,
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn unlock_calls(&self) -> usize {
        self.unlocks.load(Ordering::SeqCst)
    }

    pub(crate) fn is_held(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.exclusive || state.shared > 0
    }
}

impl PlatformLock for MemoryLock {
    fn try_lock(&self, _file: &File, mode: LockMode) -> VientoResult<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(VientoError::LockNotHeld);
        }
        if attempt < self.contended_for {
            return Err(VientoError::LockWouldBlock);
        }

        let mut state = self.state.lock().unwrap();
        match mode {
            LockMode::Exclusive if state.exclusive || state.shared > 0 => {
                Err(VientoError::LockWouldBlock)
            }
            LockMode::Exclusive => {
                state.exclusive = true;
                Ok(())
            }
            LockMode::Shared if state.exclusive => Err(VientoError::LockWouldBlock),
            LockMode::Shared => {
                state.shared += 1;
                Ok(())
            }
        }
    }

    fn unlock(&self, _file: &File) -> VientoResult<()> {
        self.unlocks.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.exclusive {
            state.exclusive = false;
            Ok(())
        } else if state.shared > 0 {
            state.shared -= 1;
            Ok(())
        } else {
            Err(VientoError::LockNotHeld)
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
