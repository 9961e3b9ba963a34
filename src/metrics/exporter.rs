use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::metrics::snapshot::ClockProMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for policy metrics snapshots.
///
/// Writes the Prometheus text exposition format so the output can be scraped
/// directly or forwarded to an OpenTelemetry collector.
///
/// ```
/// use clockpro::metrics::exporter::PrometheusTextExporter;
/// use clockpro::metrics::snapshot::ClockProMetricsSnapshot;
/// use clockpro::metrics::traits::MetricsExporter;
///
/// let exporter = PrometheusTextExporter::new("vm_clockpro", Vec::new());
/// let snapshot = ClockProMetricsSnapshot { victims: 3, ..Default::default() };
/// exporter.export(&snapshot);
/// let text = String::from_utf8(exporter.into_inner()).unwrap();
/// assert!(text.contains("vm_clockpro_victims_total 3"));
/// ```
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send + Sync> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send + Sync> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_metric(&self, kind: &str, name: &str, value: u64) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_metric("counter", &self.metric_name(suffix), value);
    }

    fn write_gauge(&self, suffix: &str, value: usize) {
        self.write_metric("gauge", &self.metric_name(suffix), value as u64);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send + Sync> MetricsExporter<ClockProMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, s: &ClockProMetricsSnapshot) {
        self.write_counter("activations_total", s.activations);
        self.write_counter("speculative_enqueues_total", s.speculative_enqueues);
        self.write_counter(
            "speculative_activation_hits_total",
            s.speculative_activation_hits,
        );
        self.write_counter(
            "speculative_cold_hand_hits_total",
            s.speculative_cold_hand_hits,
        );
        self.write_counter("speculative_misses_total", s.speculative_misses);
        self.write_counter("select_victim_calls_total", s.select_victim_calls);
        self.write_counter("victims_total", s.victims);
        self.write_counter("cold_hand_hot_skips_total", s.cold_hand_hot_skips);
        self.write_counter(
            "cold_hand_unreferenced_tested_total",
            s.cold_hand_unreferenced_tested,
        );
        self.write_counter(
            "cold_hand_unreferenced_untested_total",
            s.cold_hand_unreferenced_untested,
        );
        self.write_counter("cold_to_hot_promotions_total", s.cold_to_hot_promotions);
        self.write_counter("test_starts_total", s.test_starts);
        self.write_counter("cold_takeovers_total", s.cold_takeovers);
        self.write_counter("hot_to_cold_demotions_total", s.hot_to_cold_demotions);
        self.write_counter("hot_hand_keeps_total", s.hot_hand_keeps);
        self.write_counter("hot_hand_test_ends_total", s.hot_hand_test_ends);
        self.write_counter("hot_takeovers_total", s.hot_takeovers);
        self.write_counter("nonresident_records_total", s.nonresident_records);
        self.write_counter("nonresident_hits_total", s.nonresident_hits);
        self.write_counter("nonresident_aged_out_total", s.nonresident_aged_out);
        self.write_counter("nonresident_overwrites_total", s.nonresident_overwrites);
        self.write_counter("owner_busy_samples_total", s.owner_busy_samples);
        self.write_counter("swap_releases_total", s.swap_releases);

        self.write_gauge("tracked_pages", s.tracked_pages);
        self.write_gauge("cold_pages", s.cold_pages);
        self.write_gauge("cold_target", s.cold_target);
        self.write_gauge("new_queue_max", s.new_queue_max);
        self.write_gauge("new_len", s.new_len);
        self.write_gauge("cold_len", s.cold_len);
        self.write_gauge("hot_len", s.hot_len);
        self.write_gauge("list_len", s.list_len);
        self.write_gauge("reclaim_len", s.reclaim_len);
        self.write_gauge("nonresident_live", s.nonresident_live);
        self.write_gauge("nonresident_buckets", s.nonresident_buckets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(prefix: &str, snapshot: &ClockProMetricsSnapshot) -> String {
        let exporter = PrometheusTextExporter::new(prefix, Vec::new());
        exporter.export(snapshot);
        String::from_utf8(exporter.into_inner()).unwrap()
    }

    #[test]
    fn counters_and_gauges_are_typed() {
        let snapshot = ClockProMetricsSnapshot {
            victims: 7,
            cold_pages: 12,
            ..Default::default()
        };
        let text = render("clockpro", &snapshot);
        assert!(text.contains("# TYPE clockpro_victims_total counter\nclockpro_victims_total 7\n"));
        assert!(text.contains("# TYPE clockpro_cold_pages gauge\nclockpro_cold_pages 12\n"));
    }

    #[test]
    fn empty_prefix_uses_bare_names() {
        let text = render("", &ClockProMetricsSnapshot::default());
        assert!(text.contains("\nactivations_total 0\n"));
        assert!(!text.contains("_activations_total"));
    }
}
