//! Rolling click logs for one button.
//!
//! Every click lands in the combined log; user clicks are also kept in a
//! user-only log so synthetic clicks never inflate the measured user rate.
//! Both logs retain a trailing [`RETENTION_WINDOW`]; shorter windows are
//! derived on read.

use crate::collector::types::{ClickEvent, ClickOrigin, MouseButton};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long timestamps are kept.
pub const RETENTION_WINDOW: Duration = Duration::from_millis(1500);

/// Insertion-ordered click timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickLog {
    timestamps: VecDeque<Instant>,
}

impl ClickLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timestamp: Instant) {
        self.timestamps.push_back(timestamp);
    }

    /// Drop every entry older than `window` relative to `now`.
    pub fn prune(&mut self, now: Instant, window: Duration) {
        self.timestamps
            .retain(|&t| now.saturating_duration_since(t) <= window);
    }

    /// Entries no older than `window`, in insertion order.
    pub fn within(&self, now: Instant, window: Duration) -> impl Iterator<Item = Instant> + '_ {
        self.timestamps
            .iter()
            .copied()
            .filter(move |&t| now.saturating_duration_since(t) <= window)
    }

    pub fn count_within(&self, now: Instant, window: Duration) -> usize {
        self.within(now, window).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Instant> + '_ {
        self.timestamps.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

impl FromIterator<Instant> for ClickLog {
    fn from_iter<I: IntoIterator<Item = Instant>>(iter: I) -> Self {
        Self {
            timestamps: iter.into_iter().collect(),
        }
    }
}

/// Combined and user-only logs for a single button.
#[derive(Debug, Clone)]
pub struct ClickEventRecorder {
    button: MouseButton,
    combined: ClickLog,
    user: ClickLog,
    last_user_click: Option<Instant>,
}

impl ClickEventRecorder {
    pub fn new(button: MouseButton) -> Self {
        Self {
            button,
            combined: ClickLog::new(),
            user: ClickLog::new(),
            last_user_click: None,
        }
    }

    pub fn button(&self) -> MouseButton {
        self.button
    }

    /// Append a click. User clicks also go to the user-only log.
    pub fn record(&mut self, origin: ClickOrigin, timestamp: Instant) {
        self.combined.push(timestamp);
        if origin == ClickOrigin::User {
            self.user.push(timestamp);
            self.last_user_click = Some(match self.last_user_click {
                Some(previous) if previous > timestamp => previous,
                _ => timestamp,
            });
        }
    }

    /// Record a fully-formed event. Events for another button are ignored.
    pub fn record_event(&mut self, event: ClickEvent) -> bool {
        if event.button != self.button {
            return false;
        }
        self.record(event.origin, event.timestamp);
        true
    }

    /// Drop entries older than [`RETENTION_WINDOW`] from both logs.
    pub fn prune(&mut self, now: Instant) {
        self.combined.prune(now, RETENTION_WINDOW);
        self.user.prune(now, RETENTION_WINDOW);
    }

    pub fn combined_log(&self) -> &ClickLog {
        &self.combined
    }

    pub fn user_log(&self) -> &ClickLog {
        &self.user
    }

    /// Timestamp of the most recent user click, surviving pruning.
    pub fn last_user_click(&self) -> Option<Instant> {
        self.last_user_click
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn test_user_click_goes_to_both_logs() {
        let t0 = Instant::now();
        let mut recorder = ClickEventRecorder::new(MouseButton::Left);

        recorder.record(ClickOrigin::User, t0);
        recorder.record(ClickOrigin::Assist, ms(t0, 10));

        assert_eq!(recorder.combined_log().len(), 2);
        assert_eq!(recorder.user_log().len(), 1);
        assert_eq!(recorder.last_user_click(), Some(t0));
    }

    #[test]
    fn test_assist_click_does_not_touch_last_user_click() {
        let t0 = Instant::now();
        let mut recorder = ClickEventRecorder::new(MouseButton::Right);

        recorder.record(ClickOrigin::Assist, t0);
        assert_eq!(recorder.last_user_click(), None);
        assert!(recorder.user_log().is_empty());
    }

    #[test]
    fn test_prune_drops_old_entries() {
        let t0 = Instant::now();
        let mut recorder = ClickEventRecorder::new(MouseButton::Left);

        recorder.record(ClickOrigin::User, t0);
        recorder.record(ClickOrigin::User, ms(t0, 1000));
        recorder.record(ClickOrigin::Assist, ms(t0, 1200));

        recorder.prune(ms(t0, 1600));
        assert_eq!(recorder.user_log().len(), 1);
        assert_eq!(recorder.combined_log().len(), 2);
        // last user click outlives pruning
        assert_eq!(recorder.last_user_click(), Some(ms(t0, 1000)));
    }

    #[test]
    fn test_prune_keeps_entry_exactly_at_boundary() {
        let t0 = Instant::now();
        let mut log = ClickLog::new();
        log.push(t0);
        log.prune(ms(t0, 1500), RETENTION_WINDOW);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let t0 = Instant::now();
        let mut recorder = ClickEventRecorder::new(MouseButton::Left);
        for i in 0..10 {
            recorder.record(ClickOrigin::User, ms(t0, i * 300));
        }
        let now = ms(t0, 3000);
        recorder.prune(now);
        let once = recorder.combined_log().clone();
        recorder.prune(now);
        assert_eq!(&once, recorder.combined_log());
    }

    #[test]
    fn test_record_event_rejects_other_button() {
        let t0 = Instant::now();
        let mut recorder = ClickEventRecorder::new(MouseButton::Left);
        assert!(!recorder.record_event(ClickEvent::user(MouseButton::Right, t0)));
        assert!(recorder.record_event(ClickEvent::assist(MouseButton::Left, t0)));
        assert_eq!(recorder.combined_log().len(), 1);
    }

    #[test]
    fn test_count_within_window() {
        let t0 = Instant::now();
        let log: ClickLog = [t0, ms(t0, 400), ms(t0, 900)].into_iter().collect();
        assert_eq!(log.count_within(ms(t0, 1200), Duration::from_secs(1)), 2);
    }
}
