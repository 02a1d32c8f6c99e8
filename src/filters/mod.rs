pub mod biquad_lowpass;

pub use self::biquad_lowpass::BiquadLowpass;
