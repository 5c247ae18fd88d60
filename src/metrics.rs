use std::time::Duration;

use hdrhistogram::Histogram;

/// Latency of monitor ticks, in milliseconds.
pub struct TickStats {
    ticks: u64,
    histogram: Option<Histogram<u64>>,
}

impl TickStats {
    pub fn new() -> Self {
        // 1ms .. 10min at 2 significant digits
        let histogram = Histogram::new_with_bounds(1, 600_000, 2).ok();
        Self::with_histogram(histogram)
    }

    fn with_histogram(histogram: Option<Histogram<u64>>) -> Self {
        Self {
            ticks: 0,
            histogram,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.ticks += 1;
        if let Some(hist) = self.histogram.as_mut() {
            let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
            hist.saturating_record(millis.max(1));
        }
    }

    /// Ticks recorded so far, whether or not the histogram could be built.
    pub fn count(&self) -> u64 {
        self.ticks
    }

    /// True once every `every` recorded ticks.
    pub fn report_due(&self, every: u64) -> bool {
        self.ticks > 0 && self.ticks % every == 0
    }

    pub fn summary(&self) -> String {
        match &self.histogram {
            Some(h) if !h.is_empty() => format!(
                "ticks={} p50={}ms p99={}ms max={}ms",
                self.ticks,
                h.value_at_quantile(0.5),
                h.value_at_quantile(0.99),
                h.max()
            ),
            _ => format!("ticks={}", self.ticks),
        }
    }
}

impl Default for TickStats {
    fn default() -> Self {
        TickStats::new()
    }
}
