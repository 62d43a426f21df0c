//! Mouse click listening for click assist.
//!
//! Platform listeners observe button transitions system-wide and push
//! [`RawClick`]s into a bounded channel. The engine is the only consumer.

pub mod types;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub mod noop;

use thiserror::Error;

// Re-export commonly used types
pub use types::{ClickEvent, ClickOrigin, MouseButton, RawButton, RawClick};

#[cfg(target_os = "macos")]
pub use macos::{check_permission, permission_help, MacOSCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "macos")]
pub type Collector = MacOSCollector;

#[cfg(target_os = "windows")]
pub use windows::{check_permission, permission_help, WindowsCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "windows")]
pub type Collector = WindowsCollector;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub use noop::{check_permission, permission_help, NoopCollector};

/// Platform-agnostic collector type alias
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub type Collector = NoopCollector;

/// Value written into synthetic events so listeners can recognise them.
pub const ASSIST_EVENT_MARKER: i64 = 0x0C11_CA55;

/// Configuration for the click listener.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Report Back/Forward presses (used for the per-button toggles)
    pub capture_side_buttons: bool,
    /// Capacity of the listener -> engine channel
    pub channel_capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            capture_side_buttons: true,
            channel_capacity: 10_000,
        }
    }
}

/// Errors that can occur while listening.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("collector is already running")]
    AlreadyRunning,

    #[error("input monitoring permission not granted")]
    PermissionDenied,

    #[error("failed to create event tap")]
    TapCreationFailed,

    #[error("failed to create run loop source")]
    RunLoopSourceFailed,

    #[error("failed to install mouse hook")]
    HookInstallationFailed,
}
