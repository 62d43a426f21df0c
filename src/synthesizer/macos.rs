//! macOS click injection through CGEventPost.

use crate::collector::types::MouseButton;
use crate::collector::ASSIST_EVENT_MARKER;
use crate::synthesizer::{InputSynthesizer, SynthError};
use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGMouseButton, EventField};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

/// Posts mouse down/up pairs at the current cursor position.
#[derive(Debug, Default)]
pub struct CoreGraphicsSynthesizer;

impl CoreGraphicsSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

fn event_types(button: MouseButton) -> (CGEventType, CGEventType, CGMouseButton) {
    match button {
        MouseButton::Left => (
            CGEventType::LeftMouseDown,
            CGEventType::LeftMouseUp,
            CGMouseButton::Left,
        ),
        MouseButton::Right => (
            CGEventType::RightMouseDown,
            CGEventType::RightMouseUp,
            CGMouseButton::Right,
        ),
    }
}

impl InputSynthesizer for CoreGraphicsSynthesizer {
    fn click(&self, button: MouseButton) -> Result<(), SynthError> {
        // CGEventSource is not Send; build one per click
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .map_err(|_| SynthError::EventCreation("event source".to_string()))?;

        let location = CGEvent::new(source.clone())
            .map_err(|_| SynthError::EventCreation("cursor probe".to_string()))?
            .location();

        let (down_type, up_type, cg_button) = event_types(button);

        for event_type in [down_type, up_type] {
            let event = CGEvent::new_mouse_event(source.clone(), event_type, location, cg_button)
                .map_err(|_| SynthError::EventCreation(format!("{button} mouse event")))?;
            event.set_integer_value_field(EventField::EVENT_SOURCE_USER_DATA, ASSIST_EVENT_MARKER);
            event.post(CGEventTapLocation::HID);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "core-graphics"
    }
}
