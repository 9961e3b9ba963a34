//! CLOCK-Pro page replacement.
//!
//! Classifies externally owned pages as hot (working set) or cold
//! (replaceable) and picks eviction victims from the cold population. Pages
//! that were evicted recently are remembered in a bounded
//! [`NonResidentSet`]; one that returns while still remembered is admitted
//! straight into the hot region.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │                              ClockPro Layout                              │
//! │                                                                           │
//! │   table: PageTable            PageId ─► { tag, flags, prev, next }        │
//! │                                                                           │
//! │   queues: QueueSet  (one virtual clock, five linear segments)             │
//! │                                                                           │
//! │     NEW   [n0]─[n1]─[n2]        arrivals, capped at new_queue_max         │
//! │             │ rotate                                                      │
//! │             ▼                                                             │
//! │     LIST  [l0]─[l1]             cold pages the hot hand passed over       │
//! │             │ reinsert at cold head                                       │
//! │             ▼                                                             │
//! │     COLD  [c0]─[c1]─[c2]─[c3]   ◄── cold hand: test / promote / evict     │
//! │                                                                           │
//! │     HOT   [h0]─[h1]─[h2]        ◄── hot hand: demote quiescent pages      │
//! │                                                                           │
//! │     RECLAIM [v0]                victims waiting for remove()              │
//! │                                                                           │
//! │   nonresident: NonResidentSet   cookies of recently evicted pages         │
//! │   tracked / ncold / cold_target / new_queue_max / feedback                │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Page lifecycle
//!
//! ```text
//!   activate ──► NEW ──(rotate, initial ref cleared)──► COLD(test)
//!                                                         │
//!          referenced while in test ─► HOT ◄──────────────┘
//!                                       │ unreferenced under the hot hand
//!                                       ▼
//!                                 COLD(untested) ──► ... ──► victim
//!                                                            │ recorded
//!   activate again while remembered ─► HOT ◄── NonResidentSet┘
//! ```
//!
//! ## Caller contract
//!
//! Every mutating call takes `&mut self`, which stands in for the page-queue
//! lock the reclaim driver holds. A page returned by
//! [`select_victim`](ClockPro::select_victim) stays tracked on the RECLAIM
//! queue until the caller reclaims it and calls [`remove`](ClockPro::remove).
//! The cold hand never offers a parked page twice; a reference reported
//! through [`activate`](ClockPro::activate) returns it to COLD.
//!
//! ## Example Usage
//!
//! ```
//! use clockpro::page::{ObjectId, PageId, PageIdentity};
//! use clockpro::policy::clock_pro::ClockPro;
//! use clockpro::sim::SimHost;
//!
//! let mut host = SimHost::new();
//! let mut policy = ClockPro::new();
//! policy.reinit(64);
//!
//! for i in 0..8 {
//!     let page = PageId::new(i);
//!     host.set_identity(page, Some(PageIdentity::new(ObjectId(1), i as u64)));
//!     policy.activate(&mut host, page);
//! }
//! assert_eq!(policy.tracked_pages(), 8);
//!
//! let victim = policy.select_victim(&mut host).expect("cold pages available");
//! policy.remove(victim);
//! assert!(!policy.is_tracked(victim));
//! ```

mod hands;
mod tune;

use tracing::debug;

use crate::config::ClockProConfig;
use crate::ds::{NonResidentSet, PageTable, QueueSet};
use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::ClockProMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::ClockProMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{ClockProMetricsRecorder, MetricsSnapshotProvider};
use crate::page::{ObjectId, OwnerLock, PageFlags, PageHost, PageId, PageIdentity, QueueTag};

pub use tune::ColdTargetFeedback;

/// CLOCK-Pro replacement state for one memory domain.
#[derive(Debug)]
pub struct ClockPro {
    config: ClockProConfig,
    table: PageTable,
    queues: QueueSet,
    nonresident: NonResidentSet,
    /// Pages currently on any queue.
    tracked: usize,
    /// Tracked pages without the HOT flag.
    ncold: usize,
    cold_target: usize,
    new_queue_max: usize,
    feedback: ColdTargetFeedback,
    #[cfg(feature = "metrics")]
    metrics: ClockProMetrics,
}

impl Default for ClockPro {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPro {
    /// Creates an empty policy with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ClockProConfig::default())
    }

    /// Creates an empty policy with a validated configuration.
    ///
    /// The non-resident set starts with a single bucket; call
    /// [`reinit`](Self::reinit) once the amount of memory is known.
    pub fn with_config(config: ClockProConfig) -> Self {
        Self {
            config,
            table: PageTable::new(),
            queues: QueueSet::new(),
            nonresident: NonResidentSet::new(config.hash_factor()),
            tracked: 0,
            ncold: 0,
            cold_target: 1,
            new_queue_max: config.new_queue_min(),
            feedback: ColdTargetFeedback::default(),
            #[cfg(feature = "metrics")]
            metrics: ClockProMetrics::default(),
        }
    }

    /// Resizes the non-resident set for `total_pages` pages of memory.
    ///
    /// All non-resident history is discarded; tracked pages are unaffected.
    pub fn reinit(&mut self, total_pages: usize) {
        self.nonresident.rehash(total_pages);
        self.table.reserve_span(total_pages);
        debug!(
            total_pages,
            buckets = self.nonresident.bucket_count(),
            "clock-pro non-resident set resized"
        );
    }

    /// Marks `page` as used.
    ///
    /// An untracked page is admitted with its initial reference pending; a
    /// speculative page is reclassified now that use is confirmed. A victim
    /// still waiting for [`remove`](Self::remove) goes back to the cold
    /// region. The page's reference flag is set in every case.
    pub fn activate<H: PageHost>(&mut self, host: &mut H, page: PageId) {
        #[cfg(feature = "metrics")]
        self.metrics.record_activation();

        let flags = self.table.flags(page);
        if self.table.queue(page) == QueueTag::None {
            assert!(
                !flags.contains(PageFlags::SPECULATIVE),
                "{page} untracked but marked speculative"
            );
            self.table.insert_flags(page, PageFlags::INITIAL_REF);
            self.page_enqueue(host, page);
        } else if flags.contains(PageFlags::SPECULATIVE) {
            #[cfg(feature = "metrics")]
            self.metrics.record_speculative_activation_hit();

            self.table.remove_flags(page, PageFlags::SPECULATIVE);
            self.table.insert_flags(page, PageFlags::INITIAL_REF);
            self.page_dequeue(page);
            self.page_enqueue(host, page);
        } else if self.table.queue(page) == QueueTag::Reclaim {
            self.victim_withdraw(page);
        }
        self.table.insert_flags(page, PageFlags::REFERENCED);
        self.debug_validate_invariants();
    }

    /// Drops the pending reference on `page` without touching its queue.
    pub fn deactivate(&mut self, page: PageId) {
        self.table.remove_flags(page, PageFlags::REFERENCED);
    }

    /// Admits `page` without a confirmed use (read-ahead).
    ///
    /// The caller holds the page owner's lock. Already tracked pages are left
    /// alone.
    pub fn enqueue_speculative<H: PageHost>(&mut self, host: &mut H, page: PageId) {
        if self.is_tracked(page) {
            return;
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_speculative_enqueue();

        host.sample_reference(page, OwnerLock::Held);
        self.table
            .remove_flags(page, PageFlags::REFERENCED | PageFlags::INITIAL_REF);
        self.table.insert_flags(page, PageFlags::SPECULATIVE);
        self.page_enqueue(host, page);
        self.debug_validate_invariants();
    }

    /// Stops tracking `page` and clears its policy state.
    ///
    /// Calling this on an untracked page is a no-op.
    pub fn remove(&mut self, page: PageId) {
        if self.is_tracked(page) {
            self.page_dequeue(page);
        }
        self.table.reset(page);
        self.debug_validate_invariants();
    }

    #[inline]
    pub fn is_tracked(&self, page: PageId) -> bool {
        self.table.queue(page) != QueueTag::None
    }

    /// Returns `(active, cold)` page counts.
    #[inline]
    pub fn estimate_counts(&self) -> (usize, usize) {
        (self.tracked - self.ncold, self.ncold)
    }

    /// `true` while the cold population is below its target.
    #[inline]
    pub fn needs_scan(&self) -> bool {
        self.ncold < self.cold_target
    }

    /// Changes the configured cold percentage and retunes immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `pct` exceeds the configured ceiling; the
    /// previous percentage stays in effect.
    pub fn set_cold_target_pct(&mut self, pct: u32) -> Result<(), ConfigError> {
        self.config.set_cold_target_pct(pct)?;
        debug!(pct, "clock-pro cold target percentage changed");
        self.tune();
        Ok(())
    }

    /// Releases swap slots held by up to `n` hot pages.
    ///
    /// Walks NEW, COLD then HOT from the back. Hot pages that are referenced
    /// right now are offered first, the remaining hot pages after. Returns the
    /// number of slots released.
    pub fn relieve_swap_pressure<H: PageHost>(&mut self, host: &mut H, n: usize) -> usize {
        let mut released = 0;
        if n == 0 {
            return 0;
        }
        for referenced_pass in [true, false] {
            for tag in [QueueTag::New, QueueTag::Cold, QueueTag::Hot] {
                for page in self.queues.iter_rev(&self.table, tag) {
                    if !self.table.contains_flags(page, PageFlags::HOT)
                        || host.test_reference(page) != referenced_pass
                    {
                        continue;
                    }
                    if host.try_drop_swap(page) {
                        #[cfg(feature = "metrics")]
                        self.metrics.record_swap_release();
                        released += 1;
                        if released == n {
                            return released;
                        }
                    }
                }
            }
        }
        released
    }

    /// Forgets the non-resident record of a retired single-page object.
    pub fn forget(&mut self, object: ObjectId) -> bool {
        self.forget_page(PageIdentity::new(object, 0))
    }

    /// Forgets the non-resident record of `identity`, if any.
    pub fn forget_page(&mut self, identity: PageIdentity) -> bool {
        self.nonresident.lookup_remove(identity)
    }

    /// Whether `identity` is currently remembered as recently evicted.
    pub fn remembers(&mut self, identity: PageIdentity) -> bool {
        self.nonresident.probe(identity)
    }

    // -- introspection -----------------------------------------------------

    #[inline]
    pub fn config(&self) -> &ClockProConfig {
        &self.config
    }

    #[inline]
    pub fn tracked_pages(&self) -> usize {
        self.tracked
    }

    #[inline]
    pub fn cold_count(&self) -> usize {
        self.ncold
    }

    #[inline]
    pub fn hot_count(&self) -> usize {
        self.tracked - self.ncold
    }

    #[inline]
    pub fn cold_target(&self) -> usize {
        self.cold_target
    }

    #[inline]
    pub fn new_queue_max(&self) -> usize {
        self.new_queue_max
    }

    /// Accumulated non-resident feedback applied on top of the configured
    /// percentage.
    #[inline]
    pub fn cold_adjustment(&self) -> i64 {
        self.feedback.adjustment()
    }

    #[inline]
    pub fn queue_len(&self, tag: QueueTag) -> usize {
        self.queues.len(tag)
    }

    #[inline]
    pub fn queue_of(&self, page: PageId) -> QueueTag {
        self.table.queue(page)
    }

    #[inline]
    pub fn page_flags(&self, page: PageId) -> PageFlags {
        self.table.flags(page)
    }

    /// Pages on `tag`'s queue, oldest first.
    pub fn queue_pages(&self, tag: QueueTag) -> impl Iterator<Item = PageId> + '_ {
        self.queues.iter(&self.table, tag)
    }

    /// Number of non-resident buckets.
    #[inline]
    pub fn nonresident_buckets(&self) -> usize {
        self.nonresident.bucket_count()
    }

    /// Live non-resident records.
    pub fn nonresident_len(&self) -> usize {
        self.nonresident.live_count()
    }

    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.table.approx_bytes() + self.nonresident.approx_bytes()
    }

    // -- invariants --------------------------------------------------------

    /// Verifies queue links, tags, flags and the cold-page accounting.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.queues.check_invariants(&self.table)?;

        if self.queues.total_len() != self.tracked {
            return Err(InvariantError::new(format!(
                "tracked = {} but queues hold {}",
                self.tracked,
                self.queues.total_len()
            )));
        }

        let mut cold = 0usize;
        for (page, record) in self.table.iter_tracked() {
            let flags = record.flags();
            if flags.contains(PageFlags::HOT) {
                if flags.intersects(PageFlags::TEST | PageFlags::SPECULATIVE) {
                    return Err(InvariantError::new(format!(
                        "{page} is hot but carries {flags:?}"
                    )));
                }
            } else {
                cold += 1;
                if record.queue() == QueueTag::Hot {
                    return Err(InvariantError::new(format!(
                        "{page} on the hot queue without the HOT flag"
                    )));
                }
            }
            if record.queue() == QueueTag::Reclaim
                && flags.intersects(PageFlags::HOT | PageFlags::TEST)
            {
                return Err(InvariantError::new(format!(
                    "{page} parked for reclaim but carries {flags:?}"
                )));
            }
            if flags.contains(PageFlags::INITIAL_REF | PageFlags::SPECULATIVE) {
                return Err(InvariantError::new(format!(
                    "{page} is both speculative and awaiting its initial reference"
                )));
            }
        }
        if cold != self.ncold {
            return Err(InvariantError::new(format!(
                "ncold = {} but {} tracked pages are not hot",
                self.ncold, cold
            )));
        }
        if self.ncold > self.tracked {
            return Err(InvariantError::new(format!(
                "ncold {} exceeds tracked {}",
                self.ncold, self.tracked
            )));
        }
        if self.cold_target == 0 {
            return Err(InvariantError::new("cold target dropped to zero"));
        }
        if self.new_queue_max < self.config.new_queue_min() {
            return Err(InvariantError::new(format!(
                "new_queue_max {} below floor {}",
                self.new_queue_max,
                self.config.new_queue_min()
            )));
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if let Err(e) = self.check_invariants() {
            panic!("clock-pro invariant violated: {e}");
        }
    }

    #[cfg(not(any(test, debug_assertions)))]
    #[inline(always)]
    pub fn debug_validate_invariants(&self) {}

    // -- metrics -----------------------------------------------------------

    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> &ClockProMetrics {
        &self.metrics
    }

    #[cfg(feature = "metrics")]
    pub fn reset_metrics(&mut self) {
        self.metrics = ClockProMetrics::default();
    }
}

#[cfg(feature = "metrics")]
impl MetricsSnapshotProvider<ClockProMetricsSnapshot> for ClockPro {
    fn snapshot(&self) -> ClockProMetricsSnapshot {
        let mut snapshot = ClockProMetricsSnapshot::from(&self.metrics);
        snapshot.tracked_pages = self.tracked;
        snapshot.cold_pages = self.ncold;
        snapshot.cold_target = self.cold_target;
        snapshot.new_queue_max = self.new_queue_max;
        snapshot.new_len = self.queues.len(QueueTag::New);
        snapshot.cold_len = self.queues.len(QueueTag::Cold);
        snapshot.hot_len = self.queues.len(QueueTag::Hot);
        snapshot.list_len = self.queues.len(QueueTag::List);
        snapshot.reclaim_len = self.queues.len(QueueTag::Reclaim);
        snapshot.nonresident_live = self.nonresident.live_count();
        snapshot.nonresident_buckets = self.nonresident.bucket_count();
        snapshot
    }
}
