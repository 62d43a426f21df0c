//! Debounced "is the user still clicking" decision.
//!
//! A click within the idle timeout keeps the gate open. Past that, the gate
//! stays open for up to 1.5x the timeout, but only when the user-only log
//! shows at least two clicks within 3x the timeout. A single stale click
//! never extends the window.

use crate::core::recorder::ClickEventRecorder;
use std::time::{Duration, Instant};

/// Multiple of the idle timeout searched for burst evidence.
pub const BURST_WINDOW_FACTOR: f64 = 3.0;

/// Multiple of the idle timeout allowed once a burst is seen.
pub const EXTENDED_TIMEOUT_FACTOR: f64 = 1.5;

/// Clicks needed inside the burst window to extend the timeout.
pub const BURST_MIN_CLICKS: usize = 2;

/// Per-button activity gate.
#[derive(Debug, Clone, Copy)]
pub struct ActivityGate {
    idle_timeout: Duration,
}

impl ActivityGate {
    pub fn new(idle_timeout: Duration) -> Self {
        Self { idle_timeout }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Whether the user counts as actively clicking at `now`.
    pub fn is_active(&self, recorder: &ClickEventRecorder, now: Instant) -> bool {
        let Some(last_click) = recorder.last_user_click() else {
            return false;
        };
        let since_last = now.saturating_duration_since(last_click);

        if since_last <= self.idle_timeout {
            return true;
        }

        let burst_window = self.idle_timeout.mul_f64(BURST_WINDOW_FACTOR);
        let burst = recorder.user_log().count_within(now, burst_window);
        if burst >= BURST_MIN_CLICKS {
            return since_last <= self.idle_timeout.mul_f64(EXTENDED_TIMEOUT_FACTOR);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::{ClickOrigin, MouseButton};

    fn at(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn test_no_clicks_is_inactive() {
        let gate = ActivityGate::new(Duration::from_millis(200));
        let recorder = ClickEventRecorder::new(MouseButton::Left);
        assert!(!gate.is_active(&recorder, Instant::now()));
    }

    #[test]
    fn test_within_timeout_is_active() {
        let t0 = Instant::now();
        let gate = ActivityGate::new(Duration::from_millis(200));
        let mut recorder = ClickEventRecorder::new(MouseButton::Left);
        recorder.record(ClickOrigin::User, t0);

        assert!(gate.is_active(&recorder, at(t0, 190)));
    }

    #[test]
    fn test_single_stale_click_is_inactive() {
        let t0 = Instant::now();
        let gate = ActivityGate::new(Duration::from_millis(200));
        let mut recorder = ClickEventRecorder::new(MouseButton::Left);
        recorder.record(ClickOrigin::User, t0);

        assert!(!gate.is_active(&recorder, at(t0, 250)));
    }

    #[test]
    fn test_burst_extends_timeout() {
        let t0 = Instant::now();
        let gate = ActivityGate::new(Duration::from_millis(200));
        let mut recorder = ClickEventRecorder::new(MouseButton::Left);
        recorder.record(ClickOrigin::User, t0);
        recorder.record(ClickOrigin::User, at(t0, 100));

        // 250 ms after the last click, two clicks inside the 600 ms burst window
        assert!(gate.is_active(&recorder, at(t0, 350)));
        // extended window is 300 ms after the last click
        assert!(!gate.is_active(&recorder, at(t0, 450)));
    }

    #[test]
    fn test_assist_clicks_are_not_burst_evidence() {
        let t0 = Instant::now();
        let gate = ActivityGate::new(Duration::from_millis(200));
        let mut recorder = ClickEventRecorder::new(MouseButton::Left);
        recorder.record(ClickOrigin::User, t0);
        recorder.record(ClickOrigin::Assist, at(t0, 50));
        recorder.record(ClickOrigin::Assist, at(t0, 100));

        assert!(!gate.is_active(&recorder, at(t0, 250)));
    }
}
