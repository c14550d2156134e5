//! Admission gate for the single collection job slot.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

const UNLOCKED: u8 = 0;
const LOCKED: u8 = 1;

/// State of the job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unlocked,
    Locked,
}

/// Non-blocking gate that admits at most one job at a time.
///
/// Rejected callers are not queued. Process-local only: a restart always
/// starts `Unlocked`, even if a job was cut short.
#[derive(Debug, Default)]
pub struct JobGuard {
    state: AtomicU8,
    releases: AtomicU64,
}

impl JobGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically move `Unlocked -> Locked`.
    ///
    /// The returned permit releases the slot when dropped, whichever way the
    /// guarded work ends.
    pub fn try_acquire(self: &Arc<Self>) -> Option<JobPermit> {
        self.state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| JobPermit {
                guard: Arc::clone(self),
            })
    }

    pub fn state(&self) -> GuardState {
        match self.state.load(Ordering::Acquire) {
            UNLOCKED => GuardState::Unlocked,
            _ => GuardState::Locked,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state() == GuardState::Locked
    }

    /// Number of permits released since startup.
    pub fn release_count(&self) -> u64 {
        self.releases.load(Ordering::Acquire)
    }

    /// State and release count as one consistent pair.
    ///
    /// A counted release is always already visible as `Unlocked` (or as a
    /// later acquisition).
    pub fn snapshot(&self) -> (GuardState, u64) {
        let releases = self.release_count();
        (self.state(), releases)
    }

    fn release(&self) {
        self.state.store(UNLOCKED, Ordering::Release);
        self.releases.fetch_add(1, Ordering::AcqRel);
    }
}

/// Proof of admission; holding it keeps the slot `Locked`.
#[must_use = "dropping the permit releases the job slot immediately"]
#[derive(Debug)]
pub struct JobPermit {
    guard: Arc<JobGuard>,
}

impl Drop for JobPermit {
    fn drop(&mut self) {
        self.guard.release();
    }
}
