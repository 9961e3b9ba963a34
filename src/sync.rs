//! Lock-wrapped policy for multi-threaded reclaim drivers.
//!
//! [`SharedClockPro`] puts a [`ClockPro`] behind a `parking_lot::Mutex`, the
//! page-queue lock every mutating call needs. The cheap questions a page
//! daemon asks before deciding whether to scan (`needs_scan`,
//! `estimate_counts`) are answered from atomically published gauges without
//! taking the lock.
//!
//! ```text
//!   SharedClockPro (Clone)
//!   ┌──────────────────────────────┐
//!   │ inner:  Arc<Mutex<ClockPro>> │◄── lock() ──► ClockProGuard ──┐
//!   │ gauges: Arc<Gauges>          │◄──────── publish on drop ─────┘
//!   └──────────────────────────────┘
//!            ▲ needs_scan() / estimate_counts()  (no lock)
//! ```
//!
//! The gauges lag the policy by at most one guard lifetime.
//!
//! ```
//! use clockpro::page::{ObjectId, PageId};
//! use clockpro::policy::clock_pro::ClockPro;
//! use clockpro::sim::SimHost;
//! use clockpro::sync::SharedClockPro;
//!
//! let shared = SharedClockPro::new(ClockPro::new());
//! let mut host = SimHost::with_pages(4, ObjectId(1));
//! {
//!     let mut policy = shared.lock();
//!     policy.activate(&mut host, PageId::new(0));
//! }
//! assert_eq!(shared.estimate_counts(), (0, 1));
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::policy::clock_pro::ClockPro;

#[derive(Debug, Default)]
struct Gauges {
    tracked: AtomicUsize,
    cold: AtomicUsize,
    cold_target: AtomicUsize,
}

impl Gauges {
    fn publish(&self, policy: &ClockPro) {
        self.tracked.store(policy.tracked_pages(), Ordering::Release);
        self.cold.store(policy.cold_count(), Ordering::Release);
        self.cold_target
            .store(policy.cold_target(), Ordering::Release);
    }
}

/// Thread-safe handle to one [`ClockPro`] instance.
#[derive(Debug, Clone)]
pub struct SharedClockPro {
    inner: Arc<Mutex<ClockPro>>,
    gauges: Arc<Gauges>,
}

impl Default for SharedClockPro {
    fn default() -> Self {
        Self::new(ClockPro::new())
    }
}

impl SharedClockPro {
    pub fn new(policy: ClockPro) -> Self {
        let gauges = Gauges::default();
        gauges.publish(&policy);
        Self {
            inner: Arc::new(Mutex::new(policy)),
            gauges: Arc::new(gauges),
        }
    }

    /// Takes the page-queue lock.
    pub fn lock(&self) -> ClockProGuard<'_> {
        ClockProGuard {
            guard: self.inner.lock(),
            gauges: &self.gauges,
        }
    }

    /// Takes the page-queue lock if it is free.
    pub fn try_lock(&self) -> Option<ClockProGuard<'_>> {
        self.inner.try_lock().map(|guard| ClockProGuard {
            guard,
            gauges: &self.gauges,
        })
    }

    /// Lock-free [`ClockPro::needs_scan`] as of the last released guard.
    pub fn needs_scan(&self) -> bool {
        self.gauges.cold.load(Ordering::Acquire) < self.gauges.cold_target.load(Ordering::Acquire)
    }

    /// Lock-free [`ClockPro::estimate_counts`] as of the last released guard.
    pub fn estimate_counts(&self) -> (usize, usize) {
        let tracked = self.gauges.tracked.load(Ordering::Acquire);
        let cold = self.gauges.cold.load(Ordering::Acquire);
        (tracked.saturating_sub(cold), cold)
    }
}

/// Exclusive access to the policy; republishes the gauges when dropped.
pub struct ClockProGuard<'a> {
    guard: MutexGuard<'a, ClockPro>,
    gauges: &'a Gauges,
}

impl Deref for ClockProGuard<'_> {
    type Target = ClockPro;

    fn deref(&self) -> &ClockPro {
        &self.guard
    }
}

impl DerefMut for ClockProGuard<'_> {
    fn deref_mut(&mut self) -> &mut ClockPro {
        &mut self.guard
    }
}

impl Drop for ClockProGuard<'_> {
    fn drop(&mut self) {
        self.gauges.publish(&self.guard);
    }
}
