//! The four modulation parameters the user can change while playing.

/// Names one of the continuously-variable synth parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModParam {
    /// Modulator frequency as a ratio of the carrier frequency
    FmFrequency,
    /// Modulation depth as a ratio of the carrier frequency
    FmAmount,
    /// Lowpass cutoff in Hz
    FilterCutoff,
    /// Lowpass resonance peak in dB (converted to Q by the voice)
    FilterResonance,
}

impl ModParam {
    pub const ALL: [ModParam; 4] = [
        ModParam::FmFrequency,
        ModParam::FmAmount,
        ModParam::FilterCutoff,
        ModParam::FilterResonance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModParam::FmFrequency => "fm frequency",
            ModParam::FmAmount => "fm amount",
            ModParam::FilterCutoff => "filter cutoff",
            ModParam::FilterResonance => "filter resonance",
        }
    }

    /// Range of the user-facing control for this parameter.
    ///
    /// This bounds the control, not the synth: values set programmatically are
    /// forwarded as-is.
    pub fn control_range(self) -> (f32, f32) {
        match self {
            ModParam::FmFrequency => (0.0, 8.0),
            ModParam::FmAmount => (0.0, 8.0),
            ModParam::FilterCutoff => (20.0, 20000.0),
            ModParam::FilterResonance => (0.0, 30.0),
        }
    }

    /// Increment of one control step
    pub fn control_step(self) -> f32 {
        match self {
            ModParam::FmFrequency => 0.05,
            ModParam::FmAmount => 0.05,
            ModParam::FilterCutoff => 100.0,
            ModParam::FilterResonance => 0.5,
        }
    }
}

/// Supplies the current value of a modulation parameter
pub trait ParameterSource {
    fn current_value(&self, param: ModParam) -> f32;
}

/// Persistent control values for the four modulation parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModulationParams {
    pub fm_frequency: f32,
    pub fm_amount: f32,
    pub filter_cutoff: f32,
    pub filter_resonance: f32,
}

impl Default for ModulationParams {
    fn default() -> Self {
        Self {
            fm_frequency: 1.0,
            fm_amount: 0.5,
            filter_cutoff: 2000.0,
            filter_resonance: 1.0,
        }
    }
}

impl ModulationParams {
    pub fn get(&self, param: ModParam) -> f32 {
        match param {
            ModParam::FmFrequency => self.fm_frequency,
            ModParam::FmAmount => self.fm_amount,
            ModParam::FilterCutoff => self.filter_cutoff,
            ModParam::FilterResonance => self.filter_resonance,
        }
    }

    pub fn set(&mut self, param: ModParam, value: f32) {
        match param {
            ModParam::FmFrequency => self.fm_frequency = value,
            ModParam::FmAmount => self.fm_amount = value,
            ModParam::FilterCutoff => self.filter_cutoff = value,
            ModParam::FilterResonance => self.filter_resonance = value,
        }
    }

    /// Move a control by `steps` increments, clamped to its control range.
    /// Returns the new value.
    pub fn nudge(&mut self, param: ModParam, steps: f32) -> f32 {
        let (min, max) = param.control_range();
        let value = (self.get(param) + steps * param.control_step()).clamp(min, max);
        self.set(param, value);
        value
    }
}

impl ParameterSource for ModulationParams {
    fn current_value(&self, param: ModParam) -> f32 {
        self.get(param)
    }
}
