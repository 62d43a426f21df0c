//! Click Assist - tops up a fast-clicking user to a randomized target rate.
//!
//! This library watches physical left and right mouse clicks, measures the
//! user's clicks-per-second, and while the user is clicking fast enough it
//! injects extra clicks so the combined rate lands on a target drawn from a
//! configured range.
//!
//! # Behavior
//!
//! - **Threshold gated**: assist only runs while the user alone is strictly
//!   above the threshold CPS
//! - **Stops with the user**: an idle timeout (with a short burst extension)
//!   ends assist within a fraction of a second after the last click
//! - **Randomized target**: the goal is re-drawn from the range every
//!   0.5 to 2 seconds
//! - **No feedback loop**: synthetic clicks never count as user clicks
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Click Assist                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Collector  │──▶│  Recorder   │──▶│  Scheduler  │       │
//! │  │ (OS hooks)  │   │ (per button)│   │ (5ms tick)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                           ▲                 │               │
//! │                           │                 ▼               │
//! │  ┌─────────────┐          │          ┌─────────────┐       │
//! │  │   Readout   │◀─────────┴──────────│ Synthesizer │       │
//! │  │   (meter)   │                     │ (OS inject) │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use click_assist::{collector, AssistEngine, Config};
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let engine = Arc::new(AssistEngine::new(
//!     &config,
//!     click_assist::synthesizer::platform_synthesizer(),
//! ));
//!
//! // Requires Input Monitoring / Accessibility permission
//! let mut collector = collector::Collector::new(collector::CollectorConfig::default());
//! collector.start().expect("Failed to start collector");
//! let _ingest = engine.spawn_ingestion(collector.receiver().clone());
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod engine;
pub mod stats;
pub mod synthesizer;

// Re-export key types at crate root for convenience
pub use collector::{
    ClickEvent, ClickOrigin, Collector, CollectorConfig, CollectorError, MouseButton, RawButton,
    RawClick,
};
pub use config::{AssistConfig, Config, ConfigError, ConfigWarning, GlobalAssistState};
pub use core::{
    AssistPhase, AssistScheduler, AssistStatus, ButtonReadout, ClickEventRecorder, Clock,
    RateEstimator,
};
pub use engine::{AssistEngine, IngestOutcome, TickOutcome};
pub use stats::{AssistStats, SharedAssistStats, StatsSnapshot};
pub use synthesizer::{InputSynthesizer, SynthError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice shown before the assist starts.
pub const ASSIST_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                     CLICK ASSIST - NOTICE                        ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This tool injects extra mouse clicks while you click quickly.   ║
║                                                                  ║
║  ✓ WHAT IT DOES:                                                 ║
║    • Listens for left/right button presses (timing only)         ║
║    • Adds clicks at the cursor while you click above threshold   ║
║    • Stops as soon as you stop clicking                          ║
║                                                                  ║
║  ✗ WHAT IT NEVER DOES:                                           ║
║    • Click on its own while you are idle                         ║
║    • Read the keyboard or record cursor positions                ║
║    • Save or send anything                                       ║
║                                                                  ║
║  Mouse Back / Forward toggle left / right assist.                ║
║  Press Ctrl+C to stop.                                           ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assist_notice_contents() {
        assert!(ASSIST_NOTICE.contains("CLICK ASSIST"));
        assert!(ASSIST_NOTICE.contains("NEVER DOES"));
        assert!(ASSIST_NOTICE.contains("Ctrl+C"));
    }
}
