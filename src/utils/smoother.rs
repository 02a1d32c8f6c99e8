//! Parameter smoothing for click-free gain and cutoff changes.

/// Default smoothing time in milliseconds
pub const DEFAULT_SMOOTH_TIME_MS: f32 = 15.0;

/// Distance from the target, relative to its magnitude, treated as arrived
const SETTLE_EPSILON: f32 = 1e-6;

/// A one-pole smoothed value with range constraints.
///
/// Writes set a target; [`SmoothedParam::tick`] moves the current value toward
/// it once per sample.
#[derive(Clone, Debug)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    /// Smoothing coefficient (0-1, higher = faster)
    coeff: f32,
    settled: bool,
    pub min: f32,
    pub max: f32,
}

impl SmoothedParam {
    /// `initial_value` is clamped to `min..=max`
    pub fn new(initial_value: f32, min: f32, max: f32, sample_rate: f32, smooth_time_ms: f32) -> Self {
        let clamped = initial_value.clamp(min, max);
        Self {
            current: clamped,
            target: clamped,
            coeff: Self::calculate_coeff(sample_rate, smooth_time_ms),
            settled: true,
            min,
            max,
        }
    }

    fn calculate_coeff(sample_rate: f32, smooth_time_ms: f32) -> f32 {
        if smooth_time_ms <= 0.0 {
            return 1.0;
        }
        let smooth_time_samples = (smooth_time_ms / 1000.0) * sample_rate;
        // Reaches ~63% of a step in smooth_time_samples
        1.0 - (-1.0 / smooth_time_samples).exp()
    }

    /// Set a new target (clamped to range)
    pub fn set_target(&mut self, target: f32) {
        let clamped = target.clamp(self.min, self.max);
        if (self.target - clamped).abs() > 1e-8 {
            self.target = clamped;
            self.settled = false;
        }
    }

    /// Jump to a value without smoothing
    pub fn set_immediate(&mut self, value: f32) {
        let clamped = value.clamp(self.min, self.max);
        self.current = clamped;
        self.target = clamped;
        self.settled = true;
    }

    /// Advance one sample and return the smoothed value
    #[inline]
    pub fn tick(&mut self) -> f32 {
        if self.settled {
            return self.current;
        }

        let next = self.current + self.coeff * (self.target - self.current);
        // f32 steps can stall short of the target; snap once progress stops
        let epsilon = SETTLE_EPSILON * self.target.abs().max(1.0);
        if next == self.current || (next - self.target).abs() <= epsilon {
            self.current = self.target;
            self.settled = true;
        } else {
            self.current = next;
        }

        self.current
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}
