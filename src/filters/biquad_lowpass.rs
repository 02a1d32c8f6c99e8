use std::f32::consts::PI;

/// Biquad Lowpass Filter - RBJ Audio EQ Cookbook implementation
///
/// 2nd order resonant lowpass used as the voice filter. Direct Form I, with
/// coefficients recalculated only when cutoff or Q actually move.
pub struct BiquadLowpass {
    sample_rate: f32,

    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // Delay line
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,

    last_freq: f32,
    last_q: f32,
}

impl BiquadLowpass {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            last_freq: -1.0,
            last_q: -1.0,
        };
        filter.set_params(1000.0, 0.707);
        filter
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Set cutoff (Hz, clamped to 20 Hz - 0.45 * sample rate) and Q (clamped to 0.1-30)
    #[inline]
    pub fn set_params(&mut self, freq: f32, q: f32) {
        if (freq - self.last_freq).abs() < 0.01 && (q - self.last_q).abs() < 0.001 {
            return;
        }
        self.last_freq = freq;
        self.last_q = q;

        let freq = freq.clamp(20.0, self.sample_rate * 0.45);
        let q = q.clamp(0.1, 30.0);

        let omega0 = 2.0 * PI * freq / self.sample_rate;
        let cos_omega = omega0.cos();
        let alpha = omega0.sin() / (2.0 * q);

        let a0 = 1.0 + alpha;
        self.b0 = (1.0 - cos_omega) / 2.0 / a0;
        self.b1 = (1.0 - cos_omega) / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos_omega / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        // Flush denormals
        self.y1 = if output.abs() < 1e-15 { 0.0 } else { output };

        self.y1
    }
}
