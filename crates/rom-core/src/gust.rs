//! Wind gust tracking
//!
//! Trailing maximum of wind-speed samples over a two-minute window. Pruning
//! happens on insertion; there is no background sweep.

use std::time::{Duration, Instant};

/// Horizon of the gust window
pub const GUST_WINDOW: Duration = Duration::from_secs(120);

/// One wind-speed reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// When the sample was taken
    pub timestamp: Instant,
    /// Wind speed
    pub value: f64,
}

/// Rolling maximum of wind speed
#[derive(Debug, Clone)]
pub struct GustTracker {
    window: Vec<Sample>,
    horizon: Duration,
    current_gust: f64,
}

impl Default for GustTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GustTracker {
    /// Create an empty tracker over [`GUST_WINDOW`]
    pub fn new() -> Self {
        Self::with_horizon(GUST_WINDOW)
    }

    /// Create an empty tracker with a custom horizon
    pub fn with_horizon(horizon: Duration) -> Self {
        Self {
            window: Vec::new(),
            horizon,
            current_gust: 0.0,
        }
    }

    /// Insert a sample taken at `now`, drop samples older than the horizon and
    /// recompute the gust.
    pub fn record_sample(&mut self, value: f64, now: Instant) {
        self.window.push(Sample {
            timestamp: now,
            value,
        });

        let horizon = self.horizon;
        // Samples exactly `horizon` old are still in the window; samples
        // stamped after `now` have age zero and stay
        self.window
            .retain(|s| now.saturating_duration_since(s.timestamp) <= horizon);

        self.current_gust = self
            .window
            .iter()
            .map(|s| s.value)
            .fold(0.0, f64::max);
    }

    /// Last computed gust, `0.0` when no sample is in the window.
    ///
    /// The gust is floored at zero, so small negative offsets reported by a
    /// sensor in calm air never show up as a negative gust.
    pub fn current_gust(&self) -> f64 {
        self.current_gust
    }

    /// Samples currently retained
    pub fn window(&self) -> &[Sample] {
        &self.window
    }

    /// Number of samples in the window
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window holds no sample
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Window horizon
    pub fn horizon(&self) -> Duration {
        self.horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker_reports_zero() {
        let tracker = GustTracker::new();
        assert_eq!(tracker.current_gust(), 0.0);
        assert!(tracker.is_empty());
        assert_eq!(tracker.horizon(), GUST_WINDOW);
    }

    #[test]
    fn test_old_samples_are_pruned() {
        let t0 = Instant::now();
        let mut tracker = GustTracker::new();

        tracker.record_sample(5.0, t0);
        assert_eq!(tracker.current_gust(), 5.0);

        tracker.record_sample(9.0, t0 + Duration::from_secs(30));
        assert_eq!(tracker.current_gust(), 9.0);

        tracker.record_sample(2.0, t0 + Duration::from_secs(150));
        assert_eq!(tracker.current_gust(), 9.0);
        assert_eq!(tracker.len(), 2);
        assert!(tracker.window().iter().all(|s| s.value != 5.0));
    }

    #[test]
    fn test_gust_drops_when_peak_expires() {
        let t0 = Instant::now();
        let mut tracker = GustTracker::new();
        tracker.record_sample(12.0, t0);
        tracker.record_sample(3.0, t0 + Duration::from_secs(60));
        tracker.record_sample(4.0, t0 + Duration::from_secs(121));
        assert_eq!(tracker.current_gust(), 4.0);
    }

    #[test]
    fn test_sample_exactly_at_horizon_is_kept() {
        let t0 = Instant::now();
        let mut tracker = GustTracker::new();
        tracker.record_sample(7.0, t0);
        tracker.record_sample(1.0, t0 + GUST_WINDOW);
        assert_eq!(tracker.current_gust(), 7.0);
        assert_eq!(tracker.len(), 2);

        // One second later it has aged out
        tracker.record_sample(1.5, t0 + GUST_WINDOW + Duration::from_secs(1));
        assert_eq!(tracker.current_gust(), 1.5);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_out_of_order_sample_is_kept() {
        let t0 = Instant::now();
        let mut tracker = GustTracker::new();
        tracker.record_sample(6.0, t0 + Duration::from_secs(10));
        tracker.record_sample(2.0, t0);
        assert_eq!(tracker.current_gust(), 6.0);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_negative_offset_floors_at_zero() {
        let t0 = Instant::now();
        let mut tracker = GustTracker::with_horizon(Duration::from_secs(10));
        tracker.record_sample(-0.2, t0);
        assert_eq!(tracker.current_gust(), 0.0);
        assert_eq!(tracker.len(), 1);
    }
}
