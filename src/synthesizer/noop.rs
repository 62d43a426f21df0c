//! Injector for platforms without synthetic input support.

use crate::collector::types::MouseButton;
use crate::synthesizer::{InputSynthesizer, SynthError};

/// Always reports [`SynthError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSynthesizer;

impl InputSynthesizer for NoopSynthesizer {
    fn click(&self, _button: MouseButton) -> Result<(), SynthError> {
        Err(SynthError::Unsupported)
    }

    fn name(&self) -> &'static str {
        "unsupported"
    }
}
