//! Clicks-per-second estimation from a click log.
//!
//! A plain one-second count is noisy at low rates and lags a full second on
//! startup, so sparse logs fall back to a span-based rate over the wider
//! 1.5 s window. When the last second holds two or more clicks the count is
//! returned as-is (the window is exactly one second).

use crate::core::recorder::ClickLog;
use std::time::{Duration, Instant};

/// Wide window used to decide whether a rate can be computed at all.
pub const WIDE_WINDOW: Duration = Duration::from_millis(1500);

/// Unit window for the count-as-rate estimate.
pub const UNIT_WINDOW: Duration = Duration::from_secs(1);

/// Stateless hybrid-window CPS estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateEstimator;

impl RateEstimator {
    /// Estimate CPS for `log` as seen at `now`.
    ///
    /// Never panics or divides by zero; an empty log yields `0.0`.
    pub fn estimate(log: &ClickLog, now: Instant) -> f64 {
        let mut wide_count = 0usize;
        let mut unit_count = 0usize;
        let mut oldest: Option<Instant> = None;
        let mut newest: Option<Instant> = None;

        for t in log.within(now, WIDE_WINDOW) {
            wide_count += 1;
            if now.saturating_duration_since(t) <= UNIT_WINDOW {
                unit_count += 1;
            }
            oldest = Some(oldest.map_or(t, |o| o.min(t)));
            newest = Some(newest.map_or(t, |n| n.max(t)));
        }

        if wide_count <= 1 {
            return wide_count as f64;
        }

        if unit_count >= 2 {
            return unit_count as f64;
        }

        match (oldest, newest) {
            (Some(oldest), Some(newest)) => {
                let span = newest.saturating_duration_since(oldest).as_secs_f64();
                if span > 0.0 {
                    (wide_count - 1) as f64 / span
                } else {
                    wide_count as f64
                }
            }
            _ => wide_count as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_at(base: Instant, offsets_ms: &[u64]) -> ClickLog {
        offsets_ms
            .iter()
            .map(|&ms| base + Duration::from_millis(ms))
            .collect()
    }

    #[test]
    fn test_empty_log_is_zero() {
        assert_eq!(RateEstimator::estimate(&ClickLog::new(), Instant::now()), 0.0);
    }

    #[test]
    fn test_single_click_is_one() {
        let t0 = Instant::now();
        let log = log_at(t0, &[0]);
        assert_eq!(RateEstimator::estimate(&log, t0 + Duration::from_millis(500)), 1.0);
    }

    #[test]
    fn test_dense_clicks_count_as_rate() {
        let t0 = Instant::now();
        let log = log_at(t0, &[600, 700, 800, 900, 1000]);
        let now = t0 + Duration::from_millis(1000);
        assert_eq!(RateEstimator::estimate(&log, now), 5.0);
    }

    #[test]
    fn test_sparse_clicks_use_span() {
        let t0 = Instant::now();
        // two clicks inside 1.5 s but only one inside the last second
        let log = log_at(t0, &[0, 800]);
        let now = t0 + Duration::from_millis(1400);
        let cps = RateEstimator::estimate(&log, now);
        assert!((cps - 1.25).abs() < 1e-9, "got {cps}");
    }

    #[test]
    fn test_identical_timestamps_fall_back_to_count() {
        let t0 = Instant::now();
        let log = log_at(t0, &[0, 0]);
        // both clicks are older than a second, so the span path runs with zero span
        let now = t0 + Duration::from_millis(1200);
        assert_eq!(RateEstimator::estimate(&log, now), 2.0);
    }

    #[test]
    fn test_stale_entries_are_ignored() {
        let t0 = Instant::now();
        let log = log_at(t0, &[0, 100, 200]);
        let now = t0 + Duration::from_secs(5);
        assert_eq!(RateEstimator::estimate(&log, now), 0.0);
    }
}
