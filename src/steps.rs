use crate::engine::DEFAULT_NOTE;

/// Number of steps in the sequence. Fixed for the lifetime of the process.
pub const STEP_COUNT: usize = 16;

/// A single sequencer step: whether it sounds, and at which pitch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// Whether this step triggers a note
    pub enabled: bool,
    /// Pitch as a (fractional) MIDI note number; range is left to the synth
    pub pitch: f32,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            enabled: false,
            pitch: DEFAULT_NOTE,
        }
    }
}

impl Step {
    pub fn new(enabled: bool, pitch: f32) -> Self {
        Self { enabled, pitch }
    }

    /// An enabled step at the given pitch
    pub fn on(pitch: f32) -> Self {
        Self::new(true, pitch)
    }

    /// A disabled step that remembers its pitch
    pub fn off(pitch: f32) -> Self {
        Self::new(false, pitch)
    }
}

/// Pull-based view of the per-step inputs, read at the moment a tick needs them.
pub trait StepSource {
    fn is_enabled(&self, index: usize) -> bool;

    fn pitch(&self, index: usize) -> f32;

    fn step(&self, index: usize) -> Step {
        Step::new(self.is_enabled(index), self.pitch(index))
    }
}

/// The fixed-length table of steps edited by the user.
#[derive(Clone, Debug, PartialEq)]
pub struct StepStore {
    steps: [Step; STEP_COUNT],
}

impl Default for StepStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StepStore {
    /// All steps disabled at the default note
    pub fn new() -> Self {
        Self {
            steps: [Step::default(); STEP_COUNT],
        }
    }

    pub fn with_steps(steps: [Step; STEP_COUNT]) -> Self {
        Self { steps }
    }

    /// Build a store from an enable pattern and a pitch list.
    ///
    /// Missing pattern entries are disabled. Pitches repeat cyclically when
    /// fewer than `STEP_COUNT` are given; an empty list keeps the default note.
    pub fn from_pattern(pattern: &[bool], pitches: &[f32]) -> Self {
        let mut store = Self::new();
        for (index, step) in store.steps.iter_mut().enumerate() {
            step.enabled = pattern.get(index).copied().unwrap_or(false);
            if !pitches.is_empty() {
                step.pitch = pitches[index % pitches.len()];
            }
        }
        store
    }

    pub const fn len(&self) -> usize {
        STEP_COUNT
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<Step> {
        self.steps.get(index).copied()
    }

    pub fn steps(&self) -> &[Step; STEP_COUNT] {
        &self.steps
    }

    pub fn set(&mut self, index: usize, step: Step) {
        if let Some(slot) = self.steps.get_mut(index) {
            *slot = step;
        }
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(step) = self.steps.get_mut(index) {
            step.enabled = enabled;
        }
    }

    pub fn toggle_enabled(&mut self, index: usize) {
        if let Some(step) = self.steps.get_mut(index) {
            step.enabled = !step.enabled;
        }
    }

    pub fn set_pitch(&mut self, index: usize, pitch: f32) {
        if let Some(step) = self.steps.get_mut(index) {
            step.pitch = pitch;
        }
    }

    /// Disable every step, keeping pitches
    pub fn clear(&mut self) {
        for step in &mut self.steps {
            step.enabled = false;
        }
    }

    /// Number of enabled steps
    pub fn active_count(&self) -> usize {
        self.steps.iter().filter(|s| s.enabled).count()
    }
}

impl StepSource for StepStore {
    fn is_enabled(&self, index: usize) -> bool {
        self.steps.get(index).map(|s| s.enabled).unwrap_or(false)
    }

    fn pitch(&self, index: usize) -> f32 {
        self.steps.get(index).map(|s| s.pitch).unwrap_or(DEFAULT_NOTE)
    }

    fn step(&self, index: usize) -> Step {
        self.get(index).unwrap_or_default()
    }
}
