//! Queue mechanics and the two clock hands.
//!
//! The virtual clock is stored as linear queues. Both hands always work
//! on the head of their queue and requeue at the tail:
//!
//! ```text
//!   cold hand                                   hot hand
//!   ─────────                                   ────────
//!   rotate NEW ► COLD                           tune()
//!   hot hand                                    while ncold < cold_target:
//!   take LIST head (→ COLD head) or COLD head     take HOT head (or take over)
//!     HOT flag         → requeue to HOT           advance non-resident cycle
//!     speculative+ref  → re-enqueue               unreferenced → demote
//!     (ref, test):                                requeue
//!       (1,1) promote
//!       (1,0) start test
//!       (0,1) record non-resident, victim
//!       (0,0) victim
//! ```
//!
//! A victim is parked on RECLAIM, out of the cold hand's path, until the
//! caller removes it or a new reference puts it back on COLD.
//!
//! Every scan is bounded by the number of tracked pages, so neither hand can
//! spin on a region whose pages keep getting referenced.

use tracing::{debug, trace, warn};

#[cfg(feature = "metrics")]
use crate::metrics::traits::ClockProMetricsRecorder;
use crate::page::{OwnerLock, PageFlags, PageHost, PageId, QueueTag, RefSample};

use super::ClockPro;

impl ClockPro {
    // -- queue mechanics -----------------------------------------------------

    /// Starts tracking `page`: classifies it and appends it to NEW.
    pub(super) fn page_enqueue<H: PageHost>(&mut self, host: &mut H, page: PageId) {
        let flags = self.table.flags(page);
        assert!(
            !flags.contains(PageFlags::INITIAL_REF | PageFlags::SPECULATIVE),
            "{page} enqueued both speculative and with an initial reference"
        );
        assert_eq!(
            self.table.queue(page),
            QueueTag::None,
            "{page} enqueued while already tracked"
        );

        self.tracked += 1;
        self.table.remove_flags(page, PageFlags::HOT | PageFlags::TEST);
        if flags.contains(PageFlags::SPECULATIVE) {
            self.ncold += 1;
        } else if self.nonresident_hit(host, page) {
            self.feedback.nudge(-1);
            self.table.insert_flags(page, PageFlags::HOT);
        } else {
            #[cfg(feature = "metrics")]
            self.metrics.record_test_start();
            self.table.insert_flags(page, PageFlags::TEST);
            self.ncold += 1;
        }

        self.queues
            .insert_tail(&mut self.table, QueueTag::New, page);
        self.new_queue_rotate(host, self.new_queue_max);
    }

    /// Stops tracking `page`, keeping its flags.
    pub(super) fn page_dequeue(&mut self, page: PageId) {
        if !self.table.contains_flags(page, PageFlags::HOT) {
            assert!(self.ncold > 0, "cold count underflow dequeuing {page}");
            self.ncold -= 1;
        }
        assert!(self.tracked > 0, "tracked count underflow dequeuing {page}");
        self.tracked -= 1;
        self.queues.remove(&mut self.table, page);
    }

    /// Moves a hot- or cold-queued page to the tail of the queue its HOT flag
    /// names.
    pub(super) fn page_requeue(&mut self, page: PageId) {
        let tag = self.table.queue(page);
        assert!(
            matches!(tag, QueueTag::Hot | QueueTag::Cold),
            "{page} requeued from {tag:?}"
        );
        let target = if self.table.contains_flags(page, PageFlags::HOT) {
            QueueTag::Hot
        } else {
            QueueTag::Cold
        };
        self.queues.remove_from(&mut self.table, tag, page);
        self.queues.insert_tail(&mut self.table, target, page);
    }

    /// Moves a victim from COLD to RECLAIM.
    fn victim_park(&mut self, page: PageId) {
        self.queues
            .remove_from(&mut self.table, QueueTag::Cold, page);
        self.queues
            .insert_tail(&mut self.table, QueueTag::Reclaim, page);
    }

    /// Returns a parked victim to the COLD tail.
    pub(super) fn victim_withdraw(&mut self, page: PageId) {
        self.queues
            .remove_from(&mut self.table, QueueTag::Reclaim, page);
        self.queues
            .insert_tail(&mut self.table, QueueTag::Cold, page);
    }

    /// Moves NEW heads into COLD until at most `len` pages remain in NEW.
    ///
    /// A page still holding its admitting reference loses it here.
    pub(super) fn new_queue_rotate<H: PageHost>(&mut self, host: &mut H, len: usize) {
        while self.queues.len(QueueTag::New) > len {
            let Some(page) = self.queues.pop_front(&mut self.table, QueueTag::New) else {
                break;
            };
            if self.table.contains_flags(page, PageFlags::INITIAL_REF) {
                self.take_referenced(host, page);
                self.table.remove_flags(page, PageFlags::INITIAL_REF);
            }
            self.queues
                .insert_tail(&mut self.table, QueueTag::Cold, page);
        }
    }

    pub(super) fn new_queue_flush_one<H: PageHost>(&mut self, host: &mut H) {
        let len = self.queues.len(QueueTag::New);
        if len > 0 {
            self.new_queue_rotate(host, len - 1);
        }
    }

    // -- reference bits ------------------------------------------------------

    /// Folds the hardware reference bit into the page's REFERENCED flag.
    fn move_reference_bit<H: PageHost>(&mut self, host: &mut H, page: PageId) {
        let sample = host.sample_reference(page, OwnerLock::Try);
        if sample == RefSample::OwnerBusy {
            trace!(%page, "owner busy, reference sample skipped");
            #[cfg(feature = "metrics")]
            self.metrics.record_owner_busy();
        }
        if sample.is_referenced() {
            self.table.insert_flags(page, PageFlags::REFERENCED);
        }
    }

    /// Samples and clears both reference bits, returning whether either was
    /// set.
    fn take_referenced<H: PageHost>(&mut self, host: &mut H, page: PageId) -> bool {
        self.move_reference_bit(host, page);
        let referenced = self.table.contains_flags(page, PageFlags::REFERENCED);
        self.table.remove_flags(page, PageFlags::REFERENCED);
        referenced
    }

    // -- non-resident bookkeeping -------------------------------------------

    fn nonresident_hit<H: PageHost>(&mut self, host: &H, page: PageId) -> bool {
        let Some(identity) = host.identity(page) else {
            return false;
        };
        let hit = self.nonresident.lookup_remove(identity);
        #[cfg(feature = "metrics")]
        if hit {
            self.metrics.record_nonresident_hit();
        }
        hit
    }

    fn nonresident_record<H: PageHost>(&mut self, host: &H, page: PageId) {
        if let Some(identity) = host.identity(page) {
            #[cfg(feature = "metrics")]
            self.metrics.record_nonresident_record();
            self.nonresident.record(identity);
        }
    }

    /// Ends the test period of `page`, if it is in one.
    fn end_test(&mut self, page: PageId) {
        if self.table.contains_flags(page, PageFlags::TEST) {
            #[cfg(feature = "metrics")]
            self.metrics.record_hot_hand_test_end();
            self.feedback.nudge(-1);
            self.table.remove_flags(page, PageFlags::TEST);
        }
    }

    // -- hot hand ------------------------------------------------------------

    fn cold_target_met(&self) -> bool {
        self.ncold >= self.cold_target || self.ncold == self.tracked
    }

    /// Demotes quiescent hot pages until the cold population reaches its
    /// target.
    pub(super) fn hot_hand<H: PageHost>(&mut self, host: &mut H) {
        self.tune();
        if self.cold_target_met() {
            return;
        }

        let budget = 2 * self.tracked + 2;
        for _ in 0..budget {
            let page = match self.queues.front(QueueTag::Hot) {
                Some(page) => page,
                None => match self.hot_takeover(host) {
                    Some(page) => page,
                    None => return,
                },
            };
            self.nonresident
                .advance_cycle(self.queues.len(QueueTag::Hot));
            assert!(
                self.table.contains_flags(page, PageFlags::HOT),
                "{page} at the hot hand without the HOT flag"
            );
            if self.cold_target_met() {
                return;
            }

            if self.take_referenced(host, page) {
                #[cfg(feature = "metrics")]
                self.metrics.record_hot_hand_keep();
            } else {
                #[cfg(feature = "metrics")]
                self.metrics.record_hot_to_cold_demotion();
                self.table.remove_flags(page, PageFlags::HOT);
                self.ncold += 1;
            }
            self.page_requeue(page);
        }
        warn!(
            budget,
            ncold = self.ncold,
            cold_target = self.cold_target,
            "hot hand step budget exhausted"
        );
    }

    /// Refills an empty HOT queue from the cold side.
    ///
    /// Cold pages passed on the way end their test period and park on LIST;
    /// the first hot page found goes to the HOT head.
    fn hot_takeover<H: PageHost>(&mut self, host: &mut H) -> Option<PageId> {
        #[cfg(feature = "metrics")]
        self.metrics.record_hot_takeover();
        debug!(
            cold = self.queues.len(QueueTag::Cold),
            new = self.queues.len(QueueTag::New),
            "hot hand takeover"
        );

        loop {
            let page = match self.queues.front(QueueTag::Cold) {
                Some(page) => page,
                None => {
                    self.new_queue_flush_one(host);
                    match self.queues.front(QueueTag::Cold) {
                        Some(page) => page,
                        None => {
                            warn!(tracked = self.tracked, "hot hand found no page to take over");
                            return None;
                        },
                    }
                },
            };
            self.queues
                .remove_from(&mut self.table, QueueTag::Cold, page);
            if self.table.contains_flags(page, PageFlags::HOT) {
                self.queues
                    .insert_head(&mut self.table, QueueTag::Hot, page);
                return Some(page);
            }
            self.end_test(page);
            self.queues
                .insert_tail(&mut self.table, QueueTag::List, page);
        }
    }

    // -- cold hand -----------------------------------------------------------

    /// Picks one eviction victim from the cold region.
    ///
    /// The victim stays tracked on the RECLAIM queue, where the cold hand no
    /// longer sees it; the caller reclaims it and then calls
    /// [`remove`](ClockPro::remove). Returns `None` when no unparked page is
    /// left or the step budget runs out.
    pub fn select_victim<H: PageHost>(&mut self, host: &mut H) -> Option<PageId> {
        #[cfg(feature = "metrics")]
        self.metrics.record_select_victim_call();

        let budget = 3 * self.tracked + 16;
        for _ in 0..budget {
            self.new_queue_rotate(host, self.new_queue_max);
            self.hot_hand(host);

            let Some(page) = self.cold_front(host) else {
                warn!(tracked = self.tracked, "cold hand found no page");
                return None;
            };

            if self.table.contains_flags(page, PageFlags::HOT) {
                #[cfg(feature = "metrics")]
                self.metrics.record_cold_hand_hot_skip();
                self.page_requeue(page);
                continue;
            }

            let referenced = self.take_referenced(host, page);
            let flags = self.table.flags(page);

            if flags.contains(PageFlags::SPECULATIVE) && referenced {
                #[cfg(feature = "metrics")]
                self.metrics.record_speculative_cold_hand_hit();
                self.table.remove_flags(page, PageFlags::SPECULATIVE);
                self.page_dequeue(page);
                self.page_enqueue(host, page);
                continue;
            }

            match (referenced, flags.contains(PageFlags::TEST)) {
                (true, true) => {
                    #[cfg(feature = "metrics")]
                    self.metrics.record_cold_to_hot_promotion();
                    self.ncold -= 1;
                    self.feedback.nudge(1);
                    self.table.remove_flags(page, PageFlags::TEST);
                    self.table.insert_flags(page, PageFlags::HOT);
                    self.page_requeue(page);
                },
                (true, false) => {
                    #[cfg(feature = "metrics")]
                    self.metrics.record_test_start();
                    self.table.insert_flags(page, PageFlags::TEST);
                    self.page_requeue(page);
                },
                (false, tested) => {
                    if tested {
                        #[cfg(feature = "metrics")]
                        self.metrics.record_cold_hand_unreferenced_tested();
                        self.nonresident_record(host, page);
                        self.table.remove_flags(page, PageFlags::TEST);
                    } else {
                        #[cfg(feature = "metrics")]
                        {
                            self.metrics.record_cold_hand_unreferenced_untested();
                            if flags.contains(PageFlags::SPECULATIVE) {
                                self.metrics.record_speculative_miss();
                            }
                        }
                    }
                    self.victim_park(page);
                    self.hot_hand(host);
                    #[cfg(feature = "metrics")]
                    self.metrics.record_victim();
                    self.debug_validate_invariants();
                    return Some(page);
                },
            }
        }
        warn!(budget, tracked = self.tracked, "cold hand step budget exhausted");
        None
    }

    /// Next page under the cold hand.
    ///
    /// LIST is drained first, one page at a time, through the COLD head. An
    /// empty COLD queue is refilled from NEW and, failing that, from HOT.
    fn cold_front<H: PageHost>(&mut self, host: &mut H) -> Option<PageId> {
        if let Some(page) = self.queues.pop_front(&mut self.table, QueueTag::List) {
            self.queues
                .insert_head(&mut self.table, QueueTag::Cold, page);
            return Some(page);
        }
        if let Some(page) = self.queues.front(QueueTag::Cold) {
            return Some(page);
        }
        self.new_queue_flush_one(host);
        if let Some(page) = self.queues.front(QueueTag::Cold) {
            return Some(page);
        }

        let page = self.queues.pop_front(&mut self.table, QueueTag::Hot)?;
        #[cfg(feature = "metrics")]
        self.metrics.record_cold_takeover();
        debug!(%page, "cold hand takeover");
        self.queues
            .insert_tail(&mut self.table, QueueTag::Cold, page);
        Some(page)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ClockProConfig;
    use crate::page::{ObjectId, PageFlags, PageId, QueueTag};
    use crate::policy::clock_pro::ClockPro;
    use crate::sim::SimHost;

    fn policy(pct: u32, new_queue_min: usize) -> ClockPro {
        let config = ClockProConfig::builder()
            .cold_target_pct(pct)
            .new_queue_min(new_queue_min)
            .adaptive(false)
            .build();
        let mut policy = ClockPro::with_config(config);
        policy.reinit(64);
        policy
    }

    /// Admits `n` pages and promotes every one of them to hot.
    fn all_hot(policy: &mut ClockPro, host: &mut SimHost, n: usize) {
        for i in 0..n {
            policy.activate(host, PageId::new(i));
        }
        policy.new_queue_flush_one(host);
        while policy.queue_len(QueueTag::New) > 0 {
            policy.new_queue_flush_one(host);
        }
        // Promote directly; exercised end to end elsewhere.
        for i in 0..n {
            let page = PageId::new(i);
            policy.table.remove_flags(page, PageFlags::TEST);
            policy.table.insert_flags(page, PageFlags::HOT);
            policy.ncold -= 1;
            policy.page_requeue(page);
        }
        policy.check_invariants().unwrap();
    }

    #[test]
    fn hot_hand_demotes_unreferenced_pages_to_target() {
        let mut host = SimHost::with_pages(20, ObjectId(1));
        let mut policy = policy(50, 1);
        all_hot(&mut policy, &mut host, 20);
        assert_eq!(policy.cold_count(), 0);

        policy.hot_hand(&mut host);
        assert_eq!(policy.cold_target(), 10);
        assert_eq!(policy.cold_count(), 10);
        assert_eq!(policy.queue_len(QueueTag::Cold), 10);
        policy.check_invariants().unwrap();
    }

    #[test]
    fn hot_hand_keeps_referenced_pages_on_first_pass() {
        let mut host = SimHost::with_pages(4, ObjectId(1));
        let mut policy = policy(50, 1);
        all_hot(&mut policy, &mut host, 4);
        for i in 0..4 {
            host.touch(PageId::new(i));
        }
        policy.hot_hand(&mut host);
        // Every page survives one pass, then the second pass demotes two.
        assert_eq!(policy.cold_count(), 2);
        assert!(host.busy_samples() == 0);
        policy.check_invariants().unwrap();
    }

    #[test]
    fn hot_hand_advances_nonresident_cycle() {
        let mut host = SimHost::with_pages(14, ObjectId(1));
        let mut policy = policy(90, 1);
        all_hot(&mut policy, &mut host, 14);
        let before = policy.nonresident.cycle();
        policy.hot_hand(&mut host);
        assert!(policy.nonresident.cycle() > before);
    }

    #[test]
    fn hot_takeover_moves_cold_pages_to_list() {
        let mut host = SimHost::with_pages(6, ObjectId(1));
        let mut policy = policy(50, 1);
        for i in 0..6 {
            policy.activate(&mut host, PageId::new(i));
        }
        while policy.queue_len(QueueTag::New) > 0 {
            policy.new_queue_flush_one(&mut host);
        }
        // Make the last cold page hot without moving it.
        let hot = PageId::new(5);
        policy.table.remove_flags(hot, PageFlags::TEST);
        policy.table.insert_flags(hot, PageFlags::HOT);
        policy.ncold -= 1;

        let found = policy.hot_takeover(&mut host);
        assert_eq!(found, Some(hot));
        assert_eq!(policy.queue_of(hot), QueueTag::Hot);
        assert_eq!(policy.queue_len(QueueTag::List), 5);
        for i in 0..5 {
            assert!(!policy.page_flags(PageId::new(i)).contains(PageFlags::TEST));
        }
        assert_eq!(policy.cold_adjustment(), -5);
        policy.check_invariants().unwrap();
    }

    #[test]
    fn cold_hand_consumes_list_first() {
        let mut host = SimHost::with_pages(6, ObjectId(1));
        let mut policy = policy(50, 1);
        for i in 0..6 {
            policy.activate(&mut host, PageId::new(i));
        }
        while policy.queue_len(QueueTag::New) > 0 {
            policy.new_queue_flush_one(&mut host);
        }
        let hot = PageId::new(5);
        policy.table.remove_flags(hot, PageFlags::TEST);
        policy.table.insert_flags(hot, PageFlags::HOT);
        policy.ncold -= 1;
        policy.hot_takeover(&mut host);

        // LIST pages lost their test period, so the first is evicted as
        // untested.
        let victim = policy.select_victim(&mut host);
        assert_eq!(victim, Some(PageId::new(0)));
        policy.check_invariants().unwrap();
    }

    #[test]
    fn cold_takeover_borrows_from_hot() {
        let mut host = SimHost::with_pages(4, ObjectId(1));
        let mut policy = policy(10, 1);
        all_hot(&mut policy, &mut host, 4);

        let borrowed = policy.cold_front(&mut host);
        assert_eq!(borrowed, Some(PageId::new(0)));
        assert_eq!(policy.queue_of(PageId::new(0)), QueueTag::Cold);
        assert!(policy.page_flags(PageId::new(0)).contains(PageFlags::HOT));
        policy.check_invariants().unwrap();

        // The cold hand hands the borrowed page straight back.
        let victim = policy.select_victim(&mut host).unwrap();
        assert_eq!(victim, PageId::new(1));
        assert_eq!(policy.queue_of(PageId::new(0)), QueueTag::Hot);
        policy.check_invariants().unwrap();
    }

    #[test]
    fn speculative_page_referenced_at_cold_hand_is_reclassified() {
        let mut host = SimHost::with_pages(4, ObjectId(1));
        let mut policy = policy(10, 1);
        let spec = PageId::new(0);
        policy.enqueue_speculative(&mut host, spec);
        policy.activate(&mut host, PageId::new(1));
        policy.activate(&mut host, PageId::new(2));
        host.touch(spec);

        let victim = policy.select_victim(&mut host).unwrap();
        assert_ne!(victim, spec);
        let flags = policy.page_flags(spec);
        assert!(!flags.contains(PageFlags::SPECULATIVE));
        assert!(flags.contains(PageFlags::TEST));
        policy.check_invariants().unwrap();
    }

    #[test]
    fn unreferenced_speculative_page_is_evicted_untested() {
        let mut host = SimHost::with_pages(4, ObjectId(1));
        let mut policy = policy(10, 1);
        let spec = PageId::new(0);
        policy.enqueue_speculative(&mut host, spec);
        policy.activate(&mut host, PageId::new(1));

        let victim = policy.select_victim(&mut host).unwrap();
        assert_eq!(victim, spec);
        let identity = crate::page::PageHost::identity(&host, spec).unwrap();
        assert!(!policy.remembers(identity));
    }

    #[test]
    fn victim_is_offered_once_and_recorded_once() {
        let mut host = SimHost::with_pages(1, ObjectId(1));
        let mut policy = ClockPro::new();
        policy.reinit(64);
        let page = PageId::new(0);
        policy.activate(&mut host, page);

        assert_eq!(policy.select_victim(&mut host), Some(page));
        assert_eq!(policy.select_victim(&mut host), None);
        assert_eq!(policy.nonresident_len(), 1);
        assert_eq!(policy.queue_of(page), QueueTag::Reclaim);
        assert!(!policy.page_flags(page).contains(PageFlags::TEST));

        // Readmission consumes the only record.
        let identity = crate::page::PageHost::identity(&host, page).unwrap();
        policy.remove(page);
        policy.activate(&mut host, page);
        assert!(policy.page_flags(page).contains(PageFlags::HOT));
        assert!(!policy.remembers(identity));
        assert_eq!(policy.nonresident_len(), 0);
        policy.check_invariants().unwrap();
    }

    #[test]
    fn repeated_selection_without_remove_moves_on() {
        let mut host = SimHost::with_pages(6, ObjectId(1));
        let mut policy = policy(50, 1);
        for i in 0..6 {
            policy.activate(&mut host, PageId::new(i));
        }

        assert_eq!(policy.select_victim(&mut host), Some(PageId::new(0)));
        assert_eq!(policy.select_victim(&mut host), Some(PageId::new(1)));
        assert_eq!(policy.queue_len(QueueTag::Reclaim), 2);
        assert_eq!(policy.nonresident_len(), 2);
        // Parked victims are still tracked and still cold.
        assert_eq!(policy.tracked_pages(), 6);
        assert_eq!(policy.cold_count(), 6);
        policy.check_invariants().unwrap();
    }

    #[test]
    fn activate_returns_parked_victim_to_cold_tail() {
        let mut host = SimHost::with_pages(6, ObjectId(1));
        let mut policy = policy(50, 1);
        for i in 0..6 {
            policy.activate(&mut host, PageId::new(i));
        }
        let victim = policy.select_victim(&mut host).unwrap();
        assert_eq!(victim, PageId::new(0));

        policy.activate(&mut host, victim);
        assert_eq!(policy.queue_of(victim), QueueTag::Cold);
        assert_eq!(policy.queue_pages(QueueTag::Cold).last(), Some(victim));
        assert_eq!(policy.queue_len(QueueTag::Reclaim), 0);
        let flags = policy.page_flags(victim);
        assert!(flags.contains(PageFlags::REFERENCED));
        assert!(!flags.contains(PageFlags::TEST));
        assert_eq!(policy.tracked_pages(), 6);
        policy.check_invariants().unwrap();
    }
}
