//! Session statistics for click assist.
//!
//! Counts observed and injected clicks so a session can be audited.

pub mod counters;

// Re-export commonly used types
pub use counters::{
    create_shared_stats, AssistStats, ButtonStats, SharedAssistStats, StatsSnapshot,
};
