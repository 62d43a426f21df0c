//! Core algorithms for click assist.
//!
//! This module contains:
//! - Rolling per-button click logs (user-only and combined)
//! - Hybrid-window CPS estimation
//! - The debounced activity gate
//! - The assist scheduler state machine
//! - Display readouts derived from the same conditions

pub mod activity;
pub mod clock;
pub mod rate;
pub mod readout;
pub mod recorder;
pub mod scheduler;

// Re-export commonly used types
pub use activity::ActivityGate;
pub use clock::{Clock, ManualClock, SystemClock};
pub use rate::RateEstimator;
pub use readout::{AssistStatus, ButtonReadout};
pub use recorder::{ClickEventRecorder, ClickLog, RETENTION_WINDOW};
pub use scheduler::{
    AssistConditions, AssistPhase, AssistScheduler, SchedulerState, SkipReason, TickDecision,
    MAX_ASSIST_CPS,
};
