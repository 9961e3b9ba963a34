//! # Metrics Traits
//!
//! Recording, snapshotting and export are kept apart so the policy only ever
//! writes counters and never knows who reads them.
//!
//! ```text
//!   ┌─────────────────────────────┐
//!   │   ClockProMetricsRecorder   │   written by ClockPro under the
//!   │   record_* (one per event)  │   page-queue lock
//!   └──────────────┬──────────────┘
//!                  │ implemented by ClockProMetrics
//!                  ▼
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │───►│ MetricsExporter<S>           │
//!   │ counters + gauges, by value  │    │ Prometheus text, logs, ...   │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```
//!
//! - Production: keep the recorder, scrape snapshots through an exporter.
//! - Bench/Test: take snapshots directly and reset between iterations.

use crate::ds::ExpiryCounts;

/// Event counters for the CLOCK-Pro hands and activation API.
pub trait ClockProMetricsRecorder {
    // activation API
    fn record_activation(&mut self);
    fn record_speculative_enqueue(&mut self);
    fn record_speculative_activation_hit(&mut self);

    // cold hand
    fn record_select_victim_call(&mut self);
    fn record_victim(&mut self);
    fn record_cold_hand_hot_skip(&mut self);
    fn record_cold_hand_unreferenced_tested(&mut self);
    fn record_cold_hand_unreferenced_untested(&mut self);
    fn record_cold_to_hot_promotion(&mut self);
    fn record_test_start(&mut self);
    fn record_speculative_cold_hand_hit(&mut self);
    fn record_speculative_miss(&mut self);
    fn record_cold_takeover(&mut self);

    // hot hand
    fn record_hot_to_cold_demotion(&mut self);
    fn record_hot_hand_keep(&mut self);
    fn record_hot_hand_test_end(&mut self);
    fn record_hot_takeover(&mut self);

    // non-resident set
    fn record_nonresident_record(&mut self);
    fn record_nonresident_hit(&mut self);
    fn record_nonresident_expiries(&mut self, expired: ExpiryCounts);

    // host interaction
    fn record_owner_busy(&mut self);
    fn record_swap_release(&mut self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
