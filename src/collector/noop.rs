//! Fallback collector for platforms without a system-wide listener.
//!
//! It never observes real input, but exposes its sender so simulated click
//! sources (demos, dry runs, tests) can feed the engine through the same
//! channel a real listener would use.

use crate::collector::types::RawClick;
use crate::collector::{CollectorConfig, CollectorError};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A collector that only forwards what is pushed into it.
pub struct NoopCollector {
    _config: CollectorConfig,
    sender: Sender<RawClick>,
    receiver: Receiver<RawClick>,
    running: Arc<AtomicBool>,
}

impl NoopCollector {
    /// Create a new noop collector.
    pub fn new(config: CollectorConfig) -> Self {
        let (sender, receiver) = bounded(config.channel_capacity.max(1));
        Self {
            _config: config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark the collector as running.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stop capturing events.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the collector is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for click events.
    pub fn receiver(&self) -> &Receiver<RawClick> {
        &self.receiver
    }

    /// Sender for injecting simulated clicks.
    pub fn sender(&self) -> Sender<RawClick> {
        self.sender.clone()
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Option<RawClick> {
        self.receiver.try_recv().ok()
    }
}

/// There is no input monitoring permission gate on these platforms.
pub fn check_permission() -> bool {
    true
}

/// Nothing to grant; this build cannot observe system-wide clicks.
pub fn permission_help() -> &'static str {
    "This platform has no system-wide click listener.\n\
     Only simulated clicks (demos, tests) reach the engine."
}
