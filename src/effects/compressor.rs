/// Feed-forward peak compressor with a soft knee and automatic makeup gain.
///
/// An envelope follower tracks the input level; above the threshold the level
/// is reduced by `ratio`, across a knee of `knee_db` centred on the threshold.
/// Makeup gain restores part of the reduction a full-scale input would get, so
/// heavy settings do not leave the output near silence.
#[derive(Clone, Debug)]
pub struct Compressor {
    threshold_db: f32,
    ratio: f32,
    knee_db: f32,
    attack_coeff: f32,
    release_coeff: f32,
    makeup_db: f32,
    envelope: f32,
    reduction_db: f32,
}

/// Threshold of the voice compressor in dBFS
pub const VOICE_THRESHOLD_DB: f32 = -50.0;
/// Ratio of the voice compressor
pub const VOICE_RATIO: f32 = 5.0;

const VOICE_KNEE_DB: f32 = 30.0;
const VOICE_ATTACK_MS: f32 = 3.0;
const VOICE_RELEASE_MS: f32 = 250.0;
/// Share of the full-scale reduction given back as makeup gain
const MAKEUP_AMOUNT: f32 = 0.6;

fn time_coeff(sample_rate: f32, time_ms: f32) -> f32 {
    if time_ms <= 0.0 {
        return 1.0;
    }
    1.0 - (-1.0 / (time_ms / 1000.0 * sample_rate)).exp()
}

fn to_db(linear: f32) -> f32 {
    20.0 * linear.max(1e-9).log10()
}

fn from_db(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

impl Compressor {
    /// The compressor at the end of every voice: -50 dB threshold, ratio 5
    pub fn new(sample_rate: f32) -> Self {
        Self::with_settings(
            sample_rate,
            VOICE_THRESHOLD_DB,
            VOICE_RATIO,
            VOICE_KNEE_DB,
            VOICE_ATTACK_MS,
            VOICE_RELEASE_MS,
        )
    }

    pub fn with_settings(
        sample_rate: f32,
        threshold_db: f32,
        ratio: f32,
        knee_db: f32,
        attack_ms: f32,
        release_ms: f32,
    ) -> Self {
        let mut compressor = Self {
            threshold_db,
            ratio: ratio.max(1.0),
            knee_db: knee_db.max(0.0),
            attack_coeff: time_coeff(sample_rate, attack_ms),
            release_coeff: time_coeff(sample_rate, release_ms),
            makeup_db: 0.0,
            envelope: 0.0,
            reduction_db: 0.0,
        };
        compressor.makeup_db = -MAKEUP_AMOUNT * compressor.reduction_for(0.0);
        compressor
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.reduction_db = 0.0;
    }

    /// Gain change in dB (zero or negative) for a level of `input_db`
    fn reduction_for(&self, input_db: f32) -> f32 {
        let over = input_db - self.threshold_db;
        let half_knee = self.knee_db / 2.0;
        let slope = 1.0 / self.ratio - 1.0;

        if over <= -half_knee {
            0.0
        } else if over >= half_knee {
            slope * over
        } else {
            let x = over + half_knee;
            slope * x * x / (2.0 * self.knee_db)
        }
    }

    /// Reduction applied to the most recent sample, makeup excluded
    pub fn gain_reduction_db(&self) -> f32 {
        self.reduction_db
    }

    pub fn makeup_db(&self) -> f32 {
        self.makeup_db
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let level = input.abs();
        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope += coeff * (level - self.envelope);

        self.reduction_db = self.reduction_for(to_db(self.envelope));
        input * from_db(self.reduction_db + self.makeup_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    fn settle(compressor: &mut Compressor, level: f32) -> f32 {
        let mut output = 0.0;
        for _ in 0..SAMPLE_RATE as usize / 2 {
            output = compressor.process(level);
        }
        output
    }

    #[test]
    fn test_reduces_gain_above_threshold() {
        let mut compressor = Compressor::new(SAMPLE_RATE);
        settle(&mut compressor, 0.5);

        // -6 dBFS is 44 dB over: 44 / 5 dB out, about 35 dB of reduction
        let reduction = compressor.gain_reduction_db();
        assert!(reduction < -34.0 && reduction > -36.0, "reduction {}", reduction);
    }

    #[test]
    fn test_leaves_quiet_signals_uncompressed() {
        let mut compressor = Compressor::new(SAMPLE_RATE);
        let input = 1e-4;
        let output = settle(&mut compressor, input);

        assert_eq!(compressor.gain_reduction_db(), 0.0);
        assert!((output - input * from_db(compressor.makeup_db())).abs() < 1e-7);
    }

    #[test]
    fn test_louder_input_is_still_louder() {
        let mut soft = Compressor::new(SAMPLE_RATE);
        let mut loud = Compressor::new(SAMPLE_RATE);
        let soft_out = settle(&mut soft, 0.1);
        let loud_out = settle(&mut loud, 0.8);

        assert!(loud_out > soft_out);
        assert!(loud_out < 0.8);
    }

    #[test]
    fn test_knee_is_continuous() {
        let compressor = Compressor::new(SAMPLE_RATE);
        let edge = VOICE_THRESHOLD_DB + VOICE_KNEE_DB / 2.0;
        let below = compressor.reduction_for(edge - 1e-3);
        let above = compressor.reduction_for(edge + 1e-3);
        assert!((below - above).abs() < 1e-2);
    }

    #[test]
    fn test_silence_stays_silent() {
        let mut compressor = Compressor::new(SAMPLE_RATE);
        settle(&mut compressor, 0.8);
        assert_eq!(compressor.process(0.0), 0.0);
    }
}
