//! Adaptive cold-target tuning.
//!
//! The cold target starts as a configured percentage of tracked pages and is
//! shifted by a feedback accumulator:
//!
//! | Event                                   | Nudge |
//! |-----------------------------------------|-------|
//! | cold hand promotes a page in test       | +1    |
//! | non-resident record aged out            | +1    |
//! | non-resident record overwritten         | +1    |
//! | evicted page returns while remembered   | −1    |
//! | hot hand ends a test period             | −1    |
//!
//! The accumulator is clamped on every tune so the target stays within
//! `[1, tracked * cold_target_pct_max / 100]`; it never winds up past what the
//! clamp lets through.

#[cfg(feature = "metrics")]
use crate::metrics::traits::ClockProMetricsRecorder;

use super::ClockPro;

/// Running non-resident feedback on top of the configured cold percentage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ColdTargetFeedback {
    adjustment: i64,
}

impl ColdTargetFeedback {
    #[inline]
    pub fn adjustment(&self) -> i64 {
        self.adjustment
    }

    #[inline]
    pub(crate) fn nudge(&mut self, delta: i64) {
        self.adjustment = self.adjustment.saturating_add(delta);
    }

    /// Clamps the accumulator so `base + adjustment` lands in `[1, ceiling]`
    /// and returns that sum.
    pub(crate) fn settle(&mut self, base: usize, ceiling: usize) -> usize {
        let base = base as i64;
        let ceiling = ceiling.max(1) as i64;
        self.adjustment = self.adjustment.clamp(1 - base, ceiling - base);
        (base + self.adjustment) as usize
    }
}

impl ClockPro {
    /// Recomputes the cold target and the NEW queue cap.
    ///
    /// Pending non-resident expiries are folded into the feedback first.
    pub fn tune(&mut self) {
        let expired = self.nonresident.drain_expiries();
        #[cfg(feature = "metrics")]
        self.metrics.record_nonresident_expiries(expired);
        if expired.total() > 0 {
            self.feedback.nudge(expired.total() as i64);
        }

        let pct = self.config.cold_target_pct() as usize;
        let pct_max = self.config.cold_target_pct_max() as usize;
        let base = self.tracked * pct / 100;
        let ceiling = (self.tracked * pct_max / 100).max(1);

        self.cold_target = if self.config.adaptive() {
            self.feedback.settle(base, ceiling)
        } else {
            base.clamp(1, ceiling)
        };
        self.new_queue_max = (self.cold_target / 4).max(self.config.new_queue_min());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClockProConfig;
    use crate::page::{ObjectId, PageId};
    use crate::sim::SimHost;

    #[test]
    fn settle_clamps_both_ways() {
        let mut feedback = ColdTargetFeedback::default();
        feedback.nudge(1_000);
        assert_eq!(feedback.settle(10, 90), 90);
        assert_eq!(feedback.adjustment(), 80);

        feedback.nudge(-1_000);
        assert_eq!(feedback.settle(10, 90), 1);
        assert_eq!(feedback.adjustment(), -9);
    }

    #[test]
    fn settle_without_feedback_is_base() {
        let mut feedback = ColdTargetFeedback::default();
        assert_eq!(feedback.settle(25, 90), 25);
        assert_eq!(feedback.settle(0, 0), 1);
    }

    #[test]
    fn adaptive_target_moves_with_feedback() {
        let mut host = SimHost::with_pages(100, ObjectId(2));
        let config = ClockProConfig::builder().new_queue_min(1).build();
        let mut policy = ClockPro::with_config(config);
        for i in 0..100 {
            policy.activate(&mut host, PageId::new(i));
        }
        policy.tune();
        assert_eq!(policy.cold_target(), 10);

        policy.feedback.nudge(5);
        policy.tune();
        assert_eq!(policy.cold_target(), 15);
        assert_eq!(policy.new_queue_max(), 3);
    }

    #[test]
    fn fixed_target_ignores_feedback() {
        let mut host = SimHost::with_pages(100, ObjectId(2));
        let config = ClockProConfig::builder()
            .new_queue_min(1)
            .adaptive(false)
            .build();
        let mut policy = ClockPro::with_config(config);
        for i in 0..100 {
            policy.activate(&mut host, PageId::new(i));
        }
        policy.feedback.nudge(5);
        policy.tune();
        assert_eq!(policy.cold_target(), 10);
        assert_eq!(policy.cold_adjustment(), 5);
    }

    #[test]
    fn expiries_raise_the_target() {
        let mut host = SimHost::with_pages(100, ObjectId(2));
        let config = ClockProConfig::builder().new_queue_min(1).build();
        let mut policy = ClockPro::with_config(config);
        for i in 0..100 {
            policy.activate(&mut host, PageId::new(i));
        }
        // Single bucket: the fifteenth record overwrites a live slot.
        for offset in 0..15 {
            policy
                .nonresident
                .record(crate::page::PageIdentity::new(ObjectId(9), offset));
        }
        policy.tune();
        assert_eq!(policy.cold_adjustment(), 1);
        assert_eq!(policy.cold_target(), 11);
    }
}
