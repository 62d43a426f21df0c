//! Synthetic click injection.
//!
//! The engine only needs "click this button now"; platform modules turn that
//! into OS input tagged with [`ASSIST_EVENT_MARKER`] so the listener can tell
//! it apart from physical clicks.
//!
//! [`ASSIST_EVENT_MARKER`]: crate::collector::ASSIST_EVENT_MARKER

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub mod noop;

use crate::collector::types::MouseButton;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors from input injection. Never fatal to the engine.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("could not create input event: {0}")]
    EventCreation(String),

    #[error("input injection was rejected: {0}")]
    Injection(String),

    #[error("input injection is not supported on this platform")]
    Unsupported,
}

/// Performs an OS-level click.
pub trait InputSynthesizer: Send + Sync {
    /// Press and release `button` at the current cursor position.
    fn click(&self, button: MouseButton) -> Result<(), SynthError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Injector for the current platform.
pub fn platform_synthesizer() -> Arc<dyn InputSynthesizer> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(macos::CoreGraphicsSynthesizer::new())
    }
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::SendInputSynthesizer::new())
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Arc::new(noop::NoopSynthesizer)
    }
}

/// Counts clicks without touching the OS.
#[derive(Debug, Default)]
pub struct DryRunSynthesizer {
    clicks: [AtomicU64; 2],
}

impl DryRunSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clicks(&self, button: MouseButton) -> u64 {
        self.clicks[button.index()].load(Ordering::Relaxed)
    }
}

impl InputSynthesizer for DryRunSynthesizer {
    fn click(&self, button: MouseButton) -> Result<(), SynthError> {
        self.clicks[button.index()].fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}

/// Keeps the order of injected clicks; used by simulations and tests.
#[derive(Debug, Default)]
pub struct RecordingSynthesizer {
    clicks: Mutex<Vec<MouseButton>>,
}

impl RecordingSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clicks(&self) -> Vec<MouseButton> {
        self.clicks.lock().clone()
    }

    pub fn count(&self, button: MouseButton) -> usize {
        self.clicks.lock().iter().filter(|&&b| b == button).count()
    }
}

impl InputSynthesizer for RecordingSynthesizer {
    fn click(&self, button: MouseButton) -> Result<(), SynthError> {
        self.clicks.lock().push(button);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
