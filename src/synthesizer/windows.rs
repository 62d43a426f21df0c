//! Windows click injection through SendInput.

use crate::collector::types::MouseButton;
use crate::collector::ASSIST_EVENT_MARKER;
use crate::synthesizer::{InputSynthesizer, SynthError};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEINPUT, MOUSE_EVENT_FLAGS,
};

/// Sends a down/up pair at the current cursor position.
#[derive(Debug, Default)]
pub struct SendInputSynthesizer;

impl SendInputSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dwFlags: flags,
                dwExtraInfo: ASSIST_EVENT_MARKER as usize,
                ..Default::default()
            },
        },
    }
}

impl InputSynthesizer for SendInputSynthesizer {
    fn click(&self, button: MouseButton) -> Result<(), SynthError> {
        let (down, up) = match button {
            MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
            MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
        };
        let inputs = [mouse_input(down), mouse_input(up)];

        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            return Err(SynthError::Injection(format!(
                "SendInput accepted {sent} of {} events",
                inputs.len()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "send-input"
    }
}
