//! Output dynamics at the end of each voice

pub mod compressor;
pub mod limiter;

pub use self::compressor::*;
pub use self::limiter::*;
