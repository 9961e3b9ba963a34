use crate::metrics::metrics_impl::ClockProMetrics;

/// Counters plus gauges captured at snapshot time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockProMetricsSnapshot {
    pub activations: u64,
    pub speculative_enqueues: u64,
    pub speculative_activation_hits: u64,
    pub speculative_cold_hand_hits: u64,
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

    // gauges
    pub tracked_pages: usize,
    pub cold_pages: usize,
    pub cold_target: usize,
    pub new_queue_max: usize,
    pub new_len: usize,
    pub cold_len: usize,
    pub hot_len: usize,
    pub list_len: usize,
    pub reclaim_len: usize,
    pub nonresident_live: usize,
    pub nonresident_buckets: usize,
}

impl From<&ClockProMetrics> for ClockProMetricsSnapshot {
    /// Copies the counters; gauges are left at zero for the caller to fill.
    fn from(m: &ClockProMetrics) -> Self {
        Self {
            activations: m.activations,
            speculative_enqueues: m.speculative_enqueues,
            speculative_activation_hits: m.speculative_activation_hits,
            speculative_cold_hand_hits: m.speculative_cold_hand_hits,
            speculative_misses: m.speculative_misses,
            select_victim_calls: m.select_victim_calls,
            victims: m.victims,
            cold_hand_hot_skips: m.cold_hand_hot_skips,
            cold_hand_unreferenced_tested: m.cold_hand_unreferenced_tested,
            cold_hand_unreferenced_untested: m.cold_hand_unreferenced_untested,
            cold_to_hot_promotions: m.cold_to_hot_promotions,
            test_starts: m.test_starts,
            cold_takeovers: m.cold_takeovers,
            hot_to_cold_demotions: m.hot_to_cold_demotions,
            hot_hand_keeps: m.hot_hand_keeps,
            hot_hand_test_ends: m.hot_hand_test_ends,
            hot_takeovers: m.hot_takeovers,
            nonresident_records: m.nonresident_records,
            nonresident_hits: m.nonresident_hits,
            nonresident_aged_out: m.nonresident_aged_out,
            nonresident_overwrites: m.nonresident_overwrites,
            owner_busy_samples: m.owner_busy_samples,
            swap_releases: m.swap_releases,
            ..Self::default()
        }
    }
}
