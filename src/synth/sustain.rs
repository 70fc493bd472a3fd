use crate::dsp::envelope::EnvelopeParams;

/// Sustain pedal state owned by one voice manager.
///
/// Only consulted when a voice enters release, so flipping the pedal never
/// touches releases already in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SustainPedal {
    engaged: bool,
}

impl SustainPedal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the state actually changed.
    pub fn set(&mut self, engaged: bool) -> bool {
        let changed = self.engaged != engaged;
        self.engaged = engaged;
        changed
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Release duration for a voice released right now.
    pub fn release_time(&self, params: &EnvelopeParams) -> f64 {
        params.release_time(self.engaged)
    }
}
