use std::time::Duration;

use crate::params::ModParam;

#[cfg(feature = "native")]
pub mod engine_output;

#[cfg(feature = "native")]
pub use engine_output::EngineOutput;

pub mod scheduler;
pub mod sequencer;
pub mod transport;
pub mod voices;

pub use scheduler::{ManualScheduler, ScheduledTask, Scheduler, ThreadScheduler};
pub use sequencer::{Sequencer, TickAction, TickOutcome};
pub use transport::{PlaybackState, SessionId, Transport};
pub use voices::{VoiceBank, VoiceCommand, VoiceEngine, VoiceHandle};

/// Time between two ticks
pub const STEP_INTERVAL: Duration = Duration::from_millis(250);

/// Gain applied when a step sounds, and when a session is seeded
pub const ACTIVE_GAIN: f32 = 0.8;

/// Gain applied when a step is disabled
pub const SILENT_GAIN: f32 = 0.0;

/// Pitch the handle is seeded with before the first tick
pub const DEFAULT_NOTE: f32 = 50.0;

/// A live synthesis resource driven by the transport.
///
/// Setters may be buffered; [`SynthHandle::commit`] marks the end of one
/// logical update so an implementation can apply it atomically.
/// [`SynthHandle::release`] consumes the handle, so it cannot be used or
/// released again afterwards.
pub trait SynthHandle {
    fn set_pitch(&mut self, value: f32);

    fn set_modulation_frequency(&mut self, value: f32);

    fn set_modulation_amount(&mut self, value: f32);

    fn set_filter_cutoff(&mut self, value: f32);

    fn set_filter_resonance(&mut self, value: f32);

    fn set_gain(&mut self, value: f32);

    /// Flush the writes made since the last commit
    fn commit(&mut self) {}

    /// Tear the handle down
    fn release(self)
    where
        Self: Sized;

    /// Route a modulation parameter to its setter
    fn set_modulation(&mut self, param: ModParam, value: f32) {
        match param {
            ModParam::FmFrequency => self.set_modulation_frequency(value),
            ModParam::FmAmount => self.set_modulation_amount(value),
            ModParam::FilterCutoff => self.set_filter_cutoff(value),
            ModParam::FilterResonance => self.set_filter_resonance(value),
        }
    }
}

/// Creates one handle per playing session
pub trait SynthEngine {
    type Handle: SynthHandle;

    fn create(&mut self) -> Self::Handle;
}

/// Receives step highlight notifications, once per tick, reset first
pub trait StepPresenter {
    fn on_all_steps_reset(&mut self);

    fn on_step_highlighted(&mut self, index: usize);
}

/// No presentation attached
impl StepPresenter for () {
    fn on_all_steps_reset(&mut self) {}

    fn on_step_highlighted(&mut self, _index: usize) {}
}
