//! Click event types shared by the listener, the engine and the recorder.
//!
//! Listeners report [`RawClick`]s exactly as the platform delivered them. The
//! engine turns accepted presses into [`ClickEvent`]s tagged with their origin.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// A button the assist can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    /// Both assistable buttons, in display order.
    pub const ALL: [MouseButton; 2] = [MouseButton::Left, MouseButton::Right];

    /// Stable index for per-button arrays.
    pub fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickOrigin {
    /// A physical click by the user.
    User,
    /// A synthetic click emitted by the scheduler.
    Assist,
}

/// An observed click. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub button: MouseButton,
    pub timestamp: Instant,
    pub origin: ClickOrigin,
}

impl ClickEvent {
    pub fn user(button: MouseButton, timestamp: Instant) -> Self {
        Self {
            button,
            timestamp,
            origin: ClickOrigin::User,
        }
    }

    pub fn assist(button: MouseButton, timestamp: Instant) -> Self {
        Self {
            button,
            timestamp,
            origin: ClickOrigin::Assist,
        }
    }
}

/// Any button a listener may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawButton {
    Left,
    Right,
    /// Side button usually mapped to "back" (X1).
    Back,
    /// Side button usually mapped to "forward" (X2).
    Forward,
    Other,
}

impl RawButton {
    /// The assistable button this maps to, if any.
    pub fn assistable(self) -> Option<MouseButton> {
        match self {
            RawButton::Left => Some(MouseButton::Left),
            RawButton::Right => Some(MouseButton::Right),
            _ => None,
        }
    }

    pub fn is_side_button(self) -> bool {
        matches!(self, RawButton::Back | RawButton::Forward)
    }
}

/// A button transition as delivered by the platform listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawClick {
    pub button: RawButton,
    /// `true` for press, `false` for release.
    pub pressed: bool,
    pub timestamp: Instant,
    /// Set when the platform flags the event as synthetic.
    pub injected: bool,
}

impl RawClick {
    pub fn new(button: RawButton, pressed: bool) -> Self {
        Self::at(button, pressed, Instant::now())
    }

    pub fn at(button: RawButton, pressed: bool, timestamp: Instant) -> Self {
        Self {
            button,
            pressed,
            timestamp,
            injected: false,
        }
    }

    pub fn with_injected(mut self, injected: bool) -> Self {
        self.injected = injected;
        self
    }
}
