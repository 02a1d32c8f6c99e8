//! A 16-step FM sequencer.
//!
//! The core is the [`engine::transport::Transport`] state machine and the
//! [`engine::sequencer::Sequencer`] tick procedure. They drive any
//! [`engine::SynthHandle`]; the crate ships an FM voice engine
//! ([`engine::voices`]) rendered through cpal on native targets.

pub mod config;
pub mod effects;
pub mod engine;
pub mod filters;
pub mod gen;
pub mod params;
pub mod runtime;
pub mod steps;
pub mod utils;

// Offline rendering to WAV
#[cfg(feature = "bounce")]
pub mod bounce;

pub use config::Config;
pub use engine::sequencer::{Sequencer, TickAction, TickOutcome};
pub use engine::transport::{PlaybackState, SessionId, Transport};
pub use engine::{
    StepPresenter, SynthEngine, SynthHandle, ACTIVE_GAIN, DEFAULT_NOTE, SILENT_GAIN,
    STEP_INTERVAL,
};
pub use params::{ModParam, ModulationParams, ParameterSource};
pub use steps::{Step, StepSource, StepStore, STEP_COUNT};
