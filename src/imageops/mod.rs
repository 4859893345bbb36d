//! Image operations on extracted view buffers.

pub use self::denoise::denoise;
pub use self::tonemap::{tonemap_rgba, ToneCurve};

mod denoise;
mod tonemap;
