//! # Distance filter module
//!
//! Smooths the raw sonar readings into a single distance estimate, and keeps
//! track of how long it has been since a reading last arrived.
//!
//! Readings are delivered by the sensor driver over a bounded
//! [`robot_if::eqpt::SampleReceiver`]. The control loop drains that channel at
//! the start of each cycle and feeds every reading into the filter, so the
//! filter itself is only ever touched by the control loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, warn};
use robot_if::eqpt::DistanceSample;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of samples averaged by the filter.
pub const WINDOW_LEN: usize = 3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fixed window moving average over the latest raw samples.
#[derive(Debug, Clone)]
pub struct DistanceFilter {
    /// Ring buffer of samples.
    ///
    /// Units: centimetres
    window: [u16; WINDOW_LEN],

    /// Index of the slot the next sample is written to, which is always the
    /// oldest entry.
    next: usize,
}

/// Tracks the arrival of samples to detect a silent sensor.
#[derive(Debug, Clone)]
pub struct DistanceMonitor {
    /// Time without samples after which the sensor is considered stale.
    ///
    /// Units: seconds
    stale_after_s: f64,

    /// Time of the most recent sample, or of the monitor's creation if no
    /// sample has arrived yet.
    last_sample_s: f64,

    /// Number of samples seen so far.
    num_samples: u64,

    /// Staleness at the last check, used to report transitions.
    stale: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DistanceFilter {
    /// Create a new filter with every slot seeded to the maximum sensing
    /// range, so that the initial estimate reads as "no obstacle".
    pub fn new(max_range_cm: u16) -> Self {
        Self {
            window: [max_range_cm; WINDOW_LEN],
            next: 0,
        }
    }

    /// Add a sample, evicting the oldest one.
    pub fn record_sample(&mut self, sample: DistanceSample) {
        self.window[self.next] = sample.0;
        self.next = (self.next + 1) % WINDOW_LEN;
    }

    /// Mean of the window, truncated towards zero.
    ///
    /// Units: centimetres
    pub fn current_estimate(&self) -> u16 {
        let sum: u32 = self.window.iter().map(|&s| s as u32).sum();

        // The mean of u16 values always fits in a u16
        (sum / WINDOW_LEN as u32) as u16
    }
}

impl DistanceMonitor {
    pub fn new(stale_after_s: f64, now_s: f64) -> Self {
        Self {
            stale_after_s,
            last_sample_s: now_s,
            num_samples: 0,
            stale: false,
        }
    }

    /// Note that a sample arrived at `now_s`.
    pub fn record_arrival(&mut self, now_s: f64) {
        self.last_sample_s = now_s;
        self.num_samples += 1;
    }

    /// Returns true if no sample has arrived within the staleness window.
    ///
    /// Transitions into and out of the stale state are logged.
    pub fn check(&mut self, now_s: f64) -> bool {
        let stale = now_s - self.last_sample_s > self.stale_after_s;

        if stale && !self.stale {
            warn!(
                "No distance samples received for {:.02} s, estimate is stale",
                now_s - self.last_sample_s
            );
        } else if !stale && self.stale {
            info!("Distance samples resumed");
        }

        self.stale = stale;
        stale
    }

    pub fn num_samples(&self) -> u64 {
        self.num_samples
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_seeded_estimate() {
        let filter = DistanceFilter::new(200);
        assert_eq!(filter.current_estimate(), 200);
    }

    #[test]
    fn test_partial_window() {
        let mut filter = DistanceFilter::new(200);

        // One real sample, two seeds
        filter.record_sample(DistanceSample(50));
        assert_eq!(filter.current_estimate(), 150);

        filter.record_sample(DistanceSample(51));
        assert_eq!(filter.current_estimate(), 100);
    }

    #[test]
    fn test_mean_of_last_three() {
        let samples = [200u16, 200, 200, 35, 12, 7, 180, 0, 1, 65535, 65535, 65535];
        let mut filter = DistanceFilter::new(200);

        for (i, &s) in samples.iter().enumerate() {
            filter.record_sample(DistanceSample(s));

            if i >= 2 {
                let last: u32 = samples[i - 2..=i].iter().map(|&v| v as u32).sum();
                assert_eq!(filter.current_estimate() as u32, last / 3);
            }
        }

        assert_eq!(filter.current_estimate(), 65535);
    }

    #[test]
    fn test_truncation() {
        let mut filter = DistanceFilter::new(200);
        for s in [10, 10, 11] {
            filter.record_sample(DistanceSample(s));
        }

        // 31 / 3 = 10.33
        assert_eq!(filter.current_estimate(), 10);
    }

    #[test]
    fn test_monitor() {
        let mut monitor = DistanceMonitor::new(1.0, 0.0);

        assert!(!monitor.check(0.5));
        assert!(!monitor.check(1.0));
        assert!(monitor.check(1.5));

        monitor.record_arrival(1.6);
        assert!(!monitor.check(1.7));
        assert!(monitor.check(2.7));
        assert_eq!(monitor.num_samples(), 1);
    }
}
