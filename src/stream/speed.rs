//! Sliding-window delivery speed accounting.

use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

/// One emitted window summary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedSummary {
    /// Messages delivered during the window.
    pub messages: u64,
    /// Payload bytes delivered during the window.
    pub bytes: u64,
    /// Messages per second over the elapsed window.
    pub messages_per_sec: f64,
    /// Megabytes per second over the elapsed window.
    pub megabytes_per_sec: f64,
}

/// Message/byte tallies over a wall-clock window.
///
/// Owned by a single consumer; the receive loop is sequential so no locking
/// is involved. Rates are computed over the actually elapsed window, which
/// is at least the configured interval but usually a little longer.
pub struct SpeedGauge {
    interval: Duration,
    window_start: Instant,
    messages: u64,
    bytes: u64,
}

impl SpeedGauge {
    /// Creates a gauge, or `None` for a zero interval so the disabled case
    /// costs nothing at all.
    pub fn new(interval: Duration) -> Option<Self> {
        if interval.is_zero() {
            return None;
        }
        Some(Self {
            interval,
            window_start: Instant::now(),
            messages: 0,
            bytes: 0,
        })
    }

    /// Tallies one delivered message and emits a summary once the window
    /// interval has elapsed, resetting the counters afterwards.
    pub fn record(&mut self, payload_bytes: u64) -> Option<SpeedSummary> {
        self.messages += 1;
        self.bytes += payload_bytes;

        let elapsed = self.window_start.elapsed();
        if elapsed <= self.interval {
            return None;
        }

        let seconds = elapsed.as_secs_f64();
        let summary = SpeedSummary {
            messages: self.messages,
            bytes: self.bytes,
            messages_per_sec: self.messages as f64 / seconds,
            megabytes_per_sec: self.bytes as f64 / seconds / 1024.0 / 1024.0,
        };
        info!(
            messages_per_sec = format_args!("{:.2}", summary.messages_per_sec),
            megabytes_per_sec = format_args!("{:.2}", summary.megabytes_per_sec),
            "delivery speed"
        );

        self.window_start = Instant::now();
        self.messages = 0;
        self.bytes = 0;
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_disables_the_gauge() {
        assert!(SpeedGauge::new(Duration::ZERO).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn emits_one_summary_after_the_interval_elapses() {
        let mut gauge = SpeedGauge::new(Duration::from_secs(1)).expect("gauge enabled");

        assert_eq!(gauge.record(100), None);
        assert_eq!(gauge.record(100), None);

        tokio::time::advance(Duration::from_secs(2)).await;

        let summary = gauge.record(100).expect("summary after interval");
        assert_eq!(summary.messages, 3);
        assert_eq!(summary.bytes, 300);
        // 3 messages over exactly 2 simulated seconds.
        assert!((summary.messages_per_sec - 1.5).abs() < 1e-9);
        let expected_mb = 300.0 / 2.0 / 1024.0 / 1024.0;
        assert!((summary.megabytes_per_sec - expected_mb).abs() < 1e-12);

        // Counters reset with the new window.
        assert_eq!(gauge.messages, 0);
        assert_eq!(gauge.bytes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn window_restarts_after_a_summary() {
        let mut gauge = SpeedGauge::new(Duration::from_secs(1)).expect("gauge enabled");

        gauge.record(10);
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(gauge.record(10).is_some());

        // Fresh window: nothing emitted until the interval passes again.
        assert_eq!(gauge.record(10), None);
        tokio::time::advance(Duration::from_millis(1100)).await;
        let summary = gauge.record(10).expect("second summary");
        assert_eq!(summary.messages, 2);
        assert_eq!(summary.bytes, 20);
    }
}
