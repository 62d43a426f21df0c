//! Windows click listener using a low-level mouse hook.
//!
//! Low-level hooks run on the thread that installed them, so the sender is
//! kept in thread-local storage of the hook thread. Injected input is flagged
//! by the system (`LLMHF_INJECTED`) and by our own `dwExtraInfo` marker.

use crate::collector::types::{RawButton, RawClick};
use crate::collector::{CollectorConfig, CollectorError, ASSIST_EVENT_MARKER};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::error;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetMessageW, PostThreadMessageW, SetWindowsHookExW, UnhookWindowsHookEx,
    HHOOK, MSG, MSLLHOOKSTRUCT, WH_MOUSE_LL, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_QUIT,
    WM_RBUTTONDOWN, WM_RBUTTONUP, WM_XBUTTONDOWN, WM_XBUTTONUP,
};

/// `MSLLHOOKSTRUCT::flags` bit set for injected input.
const LLMHF_INJECTED: u32 = 0x0000_0001;

const XBUTTON1: u32 = 0x0001;
const XBUTTON2: u32 = 0x0002;

/// The Windows click collector.
pub struct WindowsCollector {
    config: CollectorConfig,
    sender: Sender<RawClick>,
    receiver: Receiver<RawClick>,
    running: Arc<AtomicBool>,
    hook_thread_id: Arc<AtomicU32>,
    thread_handle: Option<JoinHandle<()>>,
}

impl WindowsCollector {
    /// Create a new Windows collector with the given configuration.
    pub fn new(config: CollectorConfig) -> Self {
        // Use a bounded channel to prevent unbounded memory growth
        let (sender, receiver) = bounded(config.channel_capacity.max(1));

        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            hook_thread_id: Arc::new(AtomicU32::new(0)),
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
        let thread_id = self.hook_thread_id.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = run_hook_loop(sender, running.clone(), thread_id, config) {
                error!("mouse hook loop failed: {e}");
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop listening.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        // GetMessageW blocks; wake the hook thread with WM_QUIT
        let thread_id = self.hook_thread_id.swap(0, Ordering::SeqCst);
        if thread_id != 0 {
            unsafe {
                let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
            }
        }

        if let Some(handle) = self.thread_handle.take() {
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

impl Drop for WindowsCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

thread_local! {
    static EVENT_SENDER: std::cell::RefCell<Option<Sender<RawClick>>> = const { std::cell::RefCell::new(None) };
    static CAPTURE_SIDE_BUTTONS: std::cell::Cell<bool> = const { std::cell::Cell::new(true) };
}

/// Translate a hook message into a click.
fn to_raw_click(message: u32, mouse_data: u32, flags: u32, extra_info: usize) -> Option<RawClick> {
    let (button, pressed) = match message {
        WM_LBUTTONDOWN => (RawButton::Left, true),
        WM_LBUTTONUP => (RawButton::Left, false),
        WM_RBUTTONDOWN => (RawButton::Right, true),
        WM_RBUTTONUP => (RawButton::Right, false),
        WM_XBUTTONDOWN | WM_XBUTTONUP => {
            // High word of mouseData names the X button
            let button = match (mouse_data >> 16) & 0xFFFF {
                XBUTTON1 => RawButton::Back,
                XBUTTON2 => RawButton::Forward,
                _ => RawButton::Other,
            };
            (button, message == WM_XBUTTONDOWN)
        }
        _ => return None,
    };

    let injected = flags & LLMHF_INJECTED != 0 || extra_info == ASSIST_EVENT_MARKER as usize;
    Some(RawClick::at(button, pressed, Instant::now()).with_injected(injected))
}

/// Low-level mouse hook callback.
unsafe extern "system" fn mouse_hook_proc(n_code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
    if n_code >= 0 {
        let mouse_struct = &*(l_param.0 as *const MSLLHOOKSTRUCT);
        let click = to_raw_click(
            w_param.0 as u32,
            mouse_struct.mouseData,
            mouse_struct.flags,
            mouse_struct.dwExtraInfo,
        );

        if let Some(click) = click {
            let wanted = !click.button.is_side_button() || CAPTURE_SIDE_BUTTONS.with(|c| c.get());
            if wanted {
                EVENT_SENDER.with(|sender| {
                    if let Some(ref s) = *sender.borrow() {
                        let _ = s.try_send(click);
                    }
                });
            }
        }
    }

    // Pass the event to the next hook
    CallNextHookEx(HHOOK::default(), n_code, w_param, l_param)
}

fn run_hook_loop(
    sender: Sender<RawClick>,
    running: Arc<AtomicBool>,
    thread_id: Arc<AtomicU32>,
    config: CollectorConfig,
) -> Result<(), CollectorError> {
    EVENT_SENDER.with(|s| {
        *s.borrow_mut() = Some(sender);
    });
    CAPTURE_SIDE_BUTTONS.with(|c| c.set(config.capture_side_buttons));

    unsafe {
        thread_id.store(GetCurrentThreadId(), Ordering::SeqCst);

        let hook = SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), HINSTANCE::default(), 0)
            .map_err(|_| CollectorError::HookInstallationFailed)?;

        let mut msg = MSG::default();
        while running.load(Ordering::SeqCst) {
            // Hooks are serviced while the thread waits for messages
            let result = GetMessageW(&mut msg, HWND::default(), 0, 0);
            if result.0 <= 0 {
                // WM_QUIT or error
                break;
            }
        }

        let _ = UnhookWindowsHookEx(hook);
    }

    EVENT_SENDER.with(|s| {
        *s.borrow_mut() = None;
    });

    Ok(())
}

/// Check whether a low-level mouse hook can be installed.
pub fn check_permission() -> bool {
    unsafe {
        match SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), HINSTANCE::default(), 0) {
            Ok(hook) => {
                let _ = UnhookWindowsHookEx(hook);
                true
            }
            Err(_) => false,
        }
    }
}

/// What to try when the mouse hook cannot be installed.
pub fn permission_help() -> &'static str {
    "The low-level mouse hook could not be installed.\n\
     \n\
     Run from an interactive desktop session. Clicks in windows of\n\
     elevated programs are only seen when this tool also runs as administrator."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_creation() {
        let collector = WindowsCollector::new(CollectorConfig::default());
        assert!(!collector.is_running());
    }

    #[test]
    fn test_message_translation() {
        let click = to_raw_click(WM_LBUTTONDOWN, 0, 0, 0).unwrap();
        assert_eq!(click.button, RawButton::Left);
        assert!(click.pressed);
        assert!(!click.injected);

        let release = to_raw_click(WM_RBUTTONUP, 0, 0, 0).unwrap();
        assert_eq!(release.button, RawButton::Right);
        assert!(!release.pressed);

        let side = to_raw_click(WM_XBUTTONDOWN, XBUTTON2 << 16, 0, 0).unwrap();
        assert_eq!(side.button, RawButton::Forward);
    }

    #[test]
    fn test_injected_detection() {
        assert!(to_raw_click(WM_LBUTTONDOWN, 0, LLMHF_INJECTED, 0).unwrap().injected);
        let marked = to_raw_click(WM_LBUTTONDOWN, 0, 0, ASSIST_EVENT_MARKER as usize).unwrap();
        assert!(marked.injected);
    }

    #[test]
    fn test_permission_help_is_windows_specific() {
        let help = permission_help();
        assert!(help.contains("mouse hook"));
        assert!(!help.contains("System Settings"));
    }
}
