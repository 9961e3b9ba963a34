use std::fmt;

use crate::ds::ExpiryCounts;
use crate::metrics::traits::ClockProMetricsRecorder;

// ---------------------------------------------------------------------------
// ClockProMetrics
// ---------------------------------------------------------------------------

/// Plain counters owned by [`ClockPro`](crate::policy::clock_pro::ClockPro).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ClockProMetrics {
    pub activations: u64,
    pub speculative_enqueues: u64,
    /// Speculative pages confirmed through `activate`.
    pub speculative_activation_hits: u64,
    /// Speculative pages found referenced by the cold hand.
    pub speculative_cold_hand_hits: u64,
    /// Speculative pages evicted without ever being used.
    pub speculative_misses: u64,

    pub select_victim_calls: u64,
    pub victims: u64,
    pub cold_hand_hot_skips: u64,
    pub cold_hand_unreferenced_tested: u64,
    pub cold_hand_unreferenced_untested: u64,
    pub cold_to_hot_promotions: u64,
    pub test_starts: u64,
    pub cold_takeovers: u64,

    pub hot_to_cold_demotions: u64,
    pub hot_hand_keeps: u64,
    pub hot_hand_test_ends: u64,
    pub hot_takeovers: u64,

    pub nonresident_records: u64,
    pub nonresident_hits: u64,
    pub nonresident_aged_out: u64,
    pub nonresident_overwrites: u64,

    pub owner_busy_samples: u64,
    pub swap_releases: u64,
}

impl ClockProMetricsRecorder for ClockProMetrics {
    fn record_activation(&mut self) {
        self.activations += 1;
    }
    fn record_speculative_enqueue(&mut self) {
        self.speculative_enqueues += 1;
    }
    fn record_speculative_activation_hit(&mut self) {
        self.speculative_activation_hits += 1;
    }
    fn record_select_victim_call(&mut self) {
        self.select_victim_calls += 1;
    }
    fn record_victim(&mut self) {
        self.victims += 1;
    }
    fn record_cold_hand_hot_skip(&mut self) {
        self.cold_hand_hot_skips += 1;
    }
    fn record_cold_hand_unreferenced_tested(&mut self) {
        self.cold_hand_unreferenced_tested += 1;
    }
    fn record_cold_hand_unreferenced_untested(&mut self) {
        self.cold_hand_unreferenced_untested += 1;
    }
    fn record_cold_to_hot_promotion(&mut self) {
        self.cold_to_hot_promotions += 1;
    }
    fn record_test_start(&mut self) {
        self.test_starts += 1;
    }
    fn record_speculative_cold_hand_hit(&mut self) {
        self.speculative_cold_hand_hits += 1;
    }
    fn record_speculative_miss(&mut self) {
        self.speculative_misses += 1;
    }
    fn record_cold_takeover(&mut self) {
        self.cold_takeovers += 1;
    }
    fn record_hot_to_cold_demotion(&mut self) {
        self.hot_to_cold_demotions += 1;
    }
    fn record_hot_hand_keep(&mut self) {
        self.hot_hand_keeps += 1;
    }
    fn record_hot_hand_test_end(&mut self) {
        self.hot_hand_test_ends += 1;
    }
    fn record_hot_takeover(&mut self) {
        self.hot_takeovers += 1;
    }
    fn record_nonresident_record(&mut self) {
        self.nonresident_records += 1;
    }
    fn record_nonresident_hit(&mut self) {
        self.nonresident_hits += 1;
    }
    fn record_nonresident_expiries(&mut self, expired: ExpiryCounts) {
        self.nonresident_aged_out += expired.aged_out;
        self.nonresident_overwrites += expired.overwritten;
    }
    fn record_owner_busy(&mut self) {
        self.owner_busy_samples += 1;
    }
    fn record_swap_release(&mut self) {
        self.swap_releases += 1;
    }
}

impl fmt::Display for ClockProMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let victim_rate = if self.select_victim_calls > 0 {
            (self.victims as f64 / self.select_victim_calls as f64) * 100.0
        } else {
            0.0
        };

        write!(
            f,
            "ClockProMetrics {{ activations: {}, select_victim_calls: {}, victims: {}, \
             victim_rate: {:.2}%, promotions: {}, demotions: {}, nonresident_hits: {}, \
             owner_busy_samples: {} }}",
            self.activations,
            self.select_victim_calls,
            self.victims,
            victim_rate,
            self.cold_to_hot_promotions,
            self.hot_to_cold_demotions,
            self.nonresident_hits,
            self.owner_busy_samples,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_bumps_matching_counter() {
        let mut m = ClockProMetrics::default();
        m.record_victim();
        m.record_victim();
        m.record_cold_to_hot_promotion();
        m.record_nonresident_expiries(ExpiryCounts {
            aged_out: 3,
            overwritten: 1,
        });
        assert_eq!(m.victims, 2);
        assert_eq!(m.cold_to_hot_promotions, 1);
        assert_eq!(m.nonresident_aged_out, 3);
        assert_eq!(m.nonresident_overwrites, 1);
        assert_eq!(m.activations, 0);
    }

    #[test]
    fn display_reports_victim_rate() {
        let mut m = ClockProMetrics::default();
        assert!(m.to_string().contains("victim_rate: 0.00%"));
        m.record_select_victim_call();
        m.record_select_victim_call();
        m.record_victim();
        assert!(m.to_string().contains("victim_rate: 50.00%"));
    }
}
