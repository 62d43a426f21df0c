//! Session counters for click assist.
//!
//! Tracks how many clicks were observed and injected so the end-of-session
//! summary can show exactly what the tool did.

use crate::collector::types::MouseButton;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Per-button counters.
#[derive(Debug, Default)]
struct ButtonCounters {
    user_clicks: AtomicU64,
    assist_clicks: AtomicU64,
    synthesis_failures: AtomicU64,
}

/// Counters for the current session.
#[derive(Debug)]
pub struct AssistStats {
    buttons: [ButtonCounters; 2],
    /// Clicks dropped because they were our own synthetic clicks
    discarded_clicks: AtomicU64,
    /// Assist switch flips from a side button
    toggles: AtomicU64,
    session_start: DateTime<Utc>,
}

impl AssistStats {
    pub fn new() -> Self {
        Self {
            buttons: Default::default(),
            discarded_clicks: AtomicU64::new(0),
            toggles: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    fn counters(&self, button: MouseButton) -> &ButtonCounters {
        &self.buttons[button.index()]
    }

    pub fn record_user_click(&self, button: MouseButton) {
        self.counters(button)
            .user_clicks
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_assist_click(&self, button: MouseButton) {
        self.counters(button)
            .assist_clicks
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed injection; returns the running failure count.
    pub fn record_synthesis_failure(&self, button: MouseButton) -> u64 {
        self.counters(button)
            .synthesis_failures
            .fetch_add(1, Ordering::Relaxed)
            + 1
    }

    pub fn record_discarded_click(&self) {
        self.discarded_clicks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_toggle(&self) {
        self.toggles.fetch_add(1, Ordering::Relaxed);
    }

    fn button_stats(&self, button: MouseButton) -> ButtonStats {
        let counters = self.counters(button);
        ButtonStats {
            user_clicks: counters.user_clicks.load(Ordering::Relaxed),
            assist_clicks: counters.assist_clicks.load(Ordering::Relaxed),
            synthesis_failures: counters.synthesis_failures.load(Ordering::Relaxed),
        }
    }

    /// Get the current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            left: self.button_stats(MouseButton::Left),
            right: self.button_stats(MouseButton::Right),
            discarded_clicks: self.discarded_clicks.load(Ordering::Relaxed),
            toggles: self.toggles.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Left: {} user clicks, {} assist clicks, {} failed injections\n\
             - Right: {} user clicks, {} assist clicks, {} failed injections\n\
             - Self-observed clicks discarded: {}\n\
             - Side-button toggles: {}\n\
             - Session duration: {} seconds",
            stats.left.user_clicks,
            stats.left.assist_clicks,
            stats.left.synthesis_failures,
            stats.right.user_clicks,
            stats.right.assist_clicks,
            stats.right.synthesis_failures,
            stats.discarded_clicks,
            stats.toggles,
            stats.session_duration_secs
        )
    }
}

impl Default for AssistStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonStats {
    pub user_clicks: u64,
    pub assist_clicks: u64,
    pub synthesis_failures: u64,
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub left: ButtonStats,
    pub right: ButtonStats,
    pub discarded_clicks: u64,
    pub toggles: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

impl StatsSnapshot {
    pub fn button(&self, button: MouseButton) -> &ButtonStats {
        match button {
            MouseButton::Left => &self.left,
            MouseButton::Right => &self.right,
        }
    }
}

/// Thread-safe shared stats.
pub type SharedAssistStats = Arc<AssistStats>;

/// Create new shared stats.
pub fn create_shared_stats() -> SharedAssistStats {
    Arc::new(AssistStats::new())
}
