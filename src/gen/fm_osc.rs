use std::f32::consts::PI;

use crate::effects::{BrickWallLimiter, Compressor};
use crate::engine::DEFAULT_NOTE;
use crate::filters::BiquadLowpass;
use crate::utils::smoother::{SmoothedParam, DEFAULT_SMOOTH_TIME_MS};

/// Convert a (fractional) MIDI note number to Hz. Note 69 is A4 = 440 Hz.
pub fn midi_to_hz(note: f32) -> f32 {
    27.5 * 2.0_f32.powf((note - 21.0) / 12.0)
}

/// A single parameter write to an [`FmOsc`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamChange {
    Note(f32),
    FmFrequency(f32),
    FmAmount(f32),
    FilterCutoff(f32),
    FilterResonance(f32),
    Gain(f32),
}

impl ParamChange {
    /// Number of distinct parameters a change can target
    pub const SLOTS: usize = 6;

    /// Index of the parameter this change targets, in `0..SLOTS`
    pub fn slot(&self) -> usize {
        match self {
            ParamChange::Note(_) => 0,
            ParamChange::FmFrequency(_) => 1,
            ParamChange::FmAmount(_) => 2,
            ParamChange::FilterCutoff(_) => 3,
            ParamChange::FilterResonance(_) => 4,
            ParamChange::Gain(_) => 5,
        }
    }
}

/// Convert a resonance peak in dB to the linear Q of the lowpass
pub fn resonance_db_to_q(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Two-operator FM oscillator into a resonant lowpass, gain and compressor.
///
/// The modulator runs at `fm_frequency` times the carrier frequency and
/// deviates the carrier by `fm_amount` times the carrier frequency, so the
/// timbre stays the same across notes. Filter resonance is given in dB.
pub struct FmOsc {
    pub sample_rate: f32,
    note: f32,
    carrier_hz: f32,
    fm_frequency: f32,
    fm_amount: f32,
    carrier_phase: f32,
    modulator_phase: f32,
    gain: SmoothedParam,
    cutoff: SmoothedParam,
    /// Linear Q derived from the resonance in dB
    resonance_q: f32,
    filter: BiquadLowpass,
    compressor: Compressor,
    limiter: BrickWallLimiter,
    releasing: bool,
}

impl FmOsc {
    /// A silent oscillator at the default note; gain starts at zero
    pub fn new(sample_rate: f32) -> Self {
        let cutoff = 2000.0;
        let resonance_q = resonance_db_to_q(1.0);
        let mut filter = BiquadLowpass::new(sample_rate);
        filter.set_params(cutoff, resonance_q);

        Self {
            sample_rate,
            note: DEFAULT_NOTE,
            carrier_hz: midi_to_hz(DEFAULT_NOTE),
            fm_frequency: 1.0,
            fm_amount: 0.0,
            carrier_phase: 0.0,
            modulator_phase: 0.0,
            gain: SmoothedParam::new(0.0, 0.0, 1.0, sample_rate, DEFAULT_SMOOTH_TIME_MS),
            cutoff: SmoothedParam::new(
                cutoff,
                20.0,
                sample_rate * 0.45,
                sample_rate,
                DEFAULT_SMOOTH_TIME_MS,
            ),
            resonance_q,
            filter,
            compressor: Compressor::new(sample_rate),
            limiter: BrickWallLimiter::new(1.0),
            releasing: false,
        }
    }

    pub fn apply(&mut self, change: ParamChange) {
        match change {
            ParamChange::Note(note) => self.set_note(note),
            ParamChange::FmFrequency(ratio) => self.set_fm_frequency(ratio),
            ParamChange::FmAmount(amount) => self.set_fm_amount(amount),
            ParamChange::FilterCutoff(hz) => self.set_filter_cutoff(hz),
            ParamChange::FilterResonance(q) => self.set_filter_resonance(q),
            ParamChange::Gain(gain) => self.set_gain(gain),
        }
    }

    pub fn set_note(&mut self, note: f32) {
        if !note.is_finite() {
            return;
        }
        self.note = note;
        self.carrier_hz = midi_to_hz(note).clamp(0.0, self.sample_rate * 0.45);
    }

    pub fn set_fm_frequency(&mut self, ratio: f32) {
        if ratio.is_finite() {
            self.fm_frequency = ratio.max(0.0);
        }
    }

    pub fn set_fm_amount(&mut self, amount: f32) {
        if amount.is_finite() {
            self.fm_amount = amount.max(0.0);
        }
    }

    pub fn set_filter_cutoff(&mut self, hz: f32) {
        if hz.is_finite() {
            self.cutoff.set_target(hz);
        }
    }

    /// Resonance peak in dB (0 dB is a Q of 1)
    pub fn set_filter_resonance(&mut self, db: f32) {
        if db.is_finite() {
            self.resonance_q = resonance_db_to_q(db);
        }
    }

    pub fn resonance_q(&self) -> f32 {
        self.resonance_q
    }

    /// Gain is clamped to 0.0-1.0 and smoothed. Ignored once releasing.
    pub fn set_gain(&mut self, gain: f32) {
        if gain.is_finite() && !self.releasing {
            self.gain.set_target(gain);
        }
    }

    /// Fade out; the oscillator reports finished once silent
    pub fn release(&mut self) {
        self.releasing = true;
        self.gain.set_target(0.0);
    }

    pub fn is_finished(&self) -> bool {
        self.releasing && self.gain.is_settled() && self.gain.get() == 0.0
    }

    pub fn note(&self) -> f32 {
        self.note
    }

    pub fn carrier_hz(&self) -> f32 {
        self.carrier_hz
    }

    pub fn gain_target(&self) -> f32 {
        self.gain.target()
    }

    /// Generate one sample
    pub fn tick(&mut self) -> f32 {
        let gain = self.gain.tick();
        let cutoff = self.cutoff.tick();
        self.filter.set_params(cutoff, self.resonance_q);

        let modulator = (2.0 * PI * self.modulator_phase).sin();
        let deviation = self.fm_amount * self.carrier_hz * modulator;
        let carrier = (2.0 * PI * self.carrier_phase).sin();

        // Advance phases (wrapped to 0.0-1.0)
        let dt = 1.0 / self.sample_rate;
        self.carrier_phase =
            (self.carrier_phase + (self.carrier_hz + deviation) * dt).rem_euclid(1.0);
        self.modulator_phase =
            (self.modulator_phase + self.carrier_hz * self.fm_frequency * dt).rem_euclid(1.0);

        let voiced = self.filter.process(carrier) * gain;
        let output = self.limiter.process(self.compressor.process(voiced));
        if gain == 0.0 {
            return 0.0;
        }
        output
    }
}
