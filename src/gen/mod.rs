pub mod fm_osc;

pub use self::fm_osc::*;
