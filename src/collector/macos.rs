//! macOS click listener using a CGEvent tap.
//!
//! Requires Input Monitoring permission. The tap is listen-only; events are
//! passed through untouched.

use crate::collector::types::{RawButton, RawClick};
use crate::collector::{CollectorConfig, CollectorError, ASSIST_EVENT_MARKER};
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    CallbackResult, EventField,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::error;

/// The macOS click collector.
pub struct MacOSCollector {
    config: CollectorConfig,
    sender: Sender<RawClick>,
    receiver: Receiver<RawClick>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MacOSCollector {
    /// Create a new macOS collector with the given configuration.
    pub fn new(config: CollectorConfig) -> Self {
        // Use a bounded channel to prevent unbounded memory growth
        let (sender, receiver) = bounded(config.channel_capacity.max(1));

        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start listening in a background thread.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = run_event_loop(sender, running.clone(), config) {
                error!("event tap loop failed: {e}");
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop listening.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            // The thread exits once the run loop notices the flag
            let _ = handle.join();
        }
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

impl Drop for MacOSCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_event_types(config: &CollectorConfig) -> Vec<CGEventType> {
    let mut types = vec![
        CGEventType::LeftMouseDown,
        CGEventType::LeftMouseUp,
        CGEventType::RightMouseDown,
        CGEventType::RightMouseUp,
    ];

    if config.capture_side_buttons {
        types.push(CGEventType::OtherMouseDown);
        types.push(CGEventType::OtherMouseUp);
    }

    types
}

fn run_event_loop(
    sender: Sender<RawClick>,
    running: Arc<AtomicBool>,
    config: CollectorConfig,
) -> Result<(), CollectorError> {
    let event_types = build_event_types(&config);

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        event_types,
        move |_proxy, event_type, event: &CGEvent| {
            if let Some(click) = to_raw_click(event_type, event) {
                // Never block the tap; a full channel drops the event
                let _ = sender.try_send(click);
            }
            CallbackResult::Keep
        },
    )
    .map_err(|_| CollectorError::TapCreationFailed)?;

    let source = tap
        .mach_port()
        .create_runloop_source(0)
        .map_err(|_| CollectorError::RunLoopSourceFailed)?;

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&source, kCFRunLoopCommonModes);
    }

    tap.enable();

    while running.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopCommonModes },
            std::time::Duration::from_millis(100),
            false,
        );
    }

    Ok(())
}

fn to_raw_click(event_type: CGEventType, event: &CGEvent) -> Option<RawClick> {
    use core_graphics::event::CGEventType::*;

    let (button, pressed) = match event_type {
        LeftMouseDown => (RawButton::Left, true),
        LeftMouseUp => (RawButton::Left, false),
        RightMouseDown => (RawButton::Right, true),
        RightMouseUp => (RawButton::Right, false),
        OtherMouseDown | OtherMouseUp => {
            let number = event.get_integer_value_field(EventField::MOUSE_EVENT_BUTTON_NUMBER);
            (other_button(number), matches!(event_type, OtherMouseDown))
        }
        _ => return None,
    };

    let injected =
        event.get_integer_value_field(EventField::EVENT_SOURCE_USER_DATA) == ASSIST_EVENT_MARKER;

    Some(RawClick::at(button, pressed, Instant::now()).with_injected(injected))
}

/// Map a CoreGraphics "other" button number to a side button.
fn other_button(number: i64) -> RawButton {
    match number {
        3 => RawButton::Back,
        4 => RawButton::Forward,
        _ => RawButton::Other,
    }
}

/// Check whether an event tap can be created.
///
/// macOS has no direct query for Input Monitoring; creating a passive tap
/// fails when the permission is missing.
pub fn check_permission() -> bool {
    let result = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::LeftMouseDown],
        |_proxy, _type, _event| CallbackResult::Keep,
    );

    result.is_ok()
}

/// How to grant the permissions the tap and click posting need.
pub fn permission_help() -> &'static str {
    "Input Monitoring permission not granted.\n\
     \n\
     To grant permission:\n\
     1. Open System Settings > Privacy & Security\n\
     2. Select 'Input Monitoring' and 'Accessibility'\n\
     3. Add this application to both lists\n\
     4. Restart the application"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types_follow_config() {
        let all = build_event_types(&CollectorConfig::default());
        assert_eq!(all.len(), 6);

        let config = CollectorConfig {
            capture_side_buttons: false,
            ..CollectorConfig::default()
        };
        assert_eq!(build_event_types(&config).len(), 4);
    }

    #[test]
    fn test_side_button_numbers() {
        assert_eq!(other_button(3), RawButton::Back);
        assert_eq!(other_button(4), RawButton::Forward);
        assert_eq!(other_button(2), RawButton::Other);
    }

    #[test]
    fn test_permission_help_names_macos_settings() {
        assert!(permission_help().contains("Input Monitoring"));
    }

    #[test]
    fn test_collector_creation() {
        let collector = MacOSCollector::new(CollectorConfig::default());
        assert!(!collector.is_running());
    }
}
