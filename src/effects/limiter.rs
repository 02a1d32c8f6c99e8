/// A brick wall limiter that keeps samples inside `-threshold..=threshold`
#[derive(Clone, Copy, Debug)]
pub struct BrickWallLimiter {
    pub threshold: f32,
}

impl BrickWallLimiter {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    #[inline]
    pub fn process(&self, input: f32) -> f32 {
        input.clamp(-self.threshold, self.threshold)
    }
}
