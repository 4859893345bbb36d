//! Inverse-depth quantization of linear depth buffers.
//!
//! Linear world-space depth is mapped to a 16-bit code by interpolating in inverse depth
//! between the near and far planes, so near-field precision is preserved at the expense of
//! far-field precision. The code `0` is reserved: it marks samples at or beyond the far
//! plane (or otherwise unusable), and the reservation is made explicit in the type system
//! through [`DepthCode`].

use std::num::NonZeroU16;

use crate::buffer::Plane;
use crate::error::{PanoError, PanoResult, ParameterError, ParameterErrorKind};

/// A validated near/far plane pair.
///
/// Construction rejects `near >= far` and non-finite or non-positive planes, so the
/// reciprocals taken during quantization are always well defined.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthRange {
    near: f32,
    far: f32,
}

impl DepthRange {
    /// Validate a near/far plane pair.
    pub fn new(near: f32, far: f32) -> PanoResult<DepthRange> {
        if !near.is_finite() || !far.is_finite() || near <= 0.0 || far <= 0.0 || near >= far {
            return Err(PanoError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::InvalidDepthRange { near, far },
            )));
        }
        Ok(DepthRange { near, far })
    }

    /// The near plane distance.
    pub fn near(&self) -> f32 {
        self.near
    }

    /// The far plane distance.
    pub fn far(&self) -> f32 {
        self.far
    }
}

/// One quantized depth sample.
///
/// `Invalid` is the reserved raw code `0`; every valid code is nonzero, which rules out
/// accidental arithmetic on invalid samples.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum DepthCode {
    /// At or beyond the far plane, or not a usable depth.
    Invalid,
    /// An inverse-depth code in `1..=65535`, decreasing as depth increases.
    Valid(NonZeroU16),
}

impl DepthCode {
    /// Reinterpret a raw 16-bit code, mapping `0` to `Invalid`.
    pub fn from_raw(raw: u16) -> DepthCode {
        match NonZeroU16::new(raw) {
            Some(code) => DepthCode::Valid(code),
            None => DepthCode::Invalid,
        }
    }

    /// The raw 16-bit code, with `Invalid` as `0`.
    pub fn to_raw(self) -> u16 {
        match self {
            DepthCode::Invalid => 0,
            DepthCode::Valid(code) => code.get(),
        }
    }
}

/// Quantize one linear depth sample.
///
/// Depths at or beyond the far plane and non-finite depths map to [`DepthCode::Invalid`].
/// The interpolant is clamped to `[0, 65535]` before the narrowing cast, so depths closer
/// than the near plane saturate at the maximum code instead of overflowing.
pub fn encode_depth(d: f32, range: DepthRange) -> DepthCode {
    if !d.is_finite() || d >= range.far {
        return DepthCode::Invalid;
    }
    let inv_near = 1.0 / range.near;
    let inv_far = 1.0 / range.far;
    let t = 1.0 - ((1.0 / d - inv_near) / (inv_far - inv_near));
    let code = (t * 65535.0).round().clamp(0.0, 65535.0) as u16;
    DepthCode::from_raw(code)
}

/// Recover a linear depth from a quantized sample; the algebraic inverse of [`encode_depth`].
///
/// `Invalid` decodes to `+∞` (at or beyond the far plane).
pub fn decode_depth(code: DepthCode, range: DepthRange) -> f32 {
    let q = match code {
        DepthCode::Invalid => return f32::INFINITY,
        DepthCode::Valid(q) => q.get(),
    };
    let inv_near = 1.0 / range.near;
    let inv_far = 1.0 / range.far;
    let t = f32::from(q) / 65535.0;
    1.0 / (inv_near + (1.0 - t) * (inv_far - inv_near))
}

/// Quantize a whole depth plane into raw 16-bit codes ready for compression.
pub fn quantize_plane(depth: &Plane<f32>, range: DepthRange) -> Plane<u16> {
    let (width, height) = depth.dimensions();
    let data = depth
        .as_raw()
        .iter()
        .map(|&d| encode_depth(d, range).to_raw())
        .collect();
    Plane::from_raw(width, height, data).expect("one output sample per input sample")
}

/// Recover a linear depth plane from raw 16-bit codes.
///
/// Invalid samples decode to `+∞`.
pub fn dequantize_plane(quantized: &Plane<u16>, range: DepthRange) -> Plane<f32> {
    let (width, height) = quantized.dimensions();
    let data = quantized
        .as_raw()
        .iter()
        .map(|&raw| decode_depth(DepthCode::from_raw(raw), range))
        .collect();
    Plane::from_raw(width, height, data).expect("one output sample per input sample")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> DepthRange {
        DepthRange::new(1.0, 10.0).unwrap()
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(DepthRange::new(1.0, 1.0).is_err());
        assert!(DepthRange::new(10.0, 1.0).is_err());
        assert!(DepthRange::new(0.0, 10.0).is_err());
        assert!(DepthRange::new(-1.0, 10.0).is_err());
        assert!(DepthRange::new(1.0, f32::INFINITY).is_err());
        assert!(DepthRange::new(f32::NAN, 10.0).is_err());
    }

    #[test]
    fn quantizes_known_value() {
        // t = 1 - ((1/5 - 1/1) / (1/10 - 1/1)) = 1/9, and 65535/9 rounds to 7282.
        assert_eq!(encode_depth(5.0, range()).to_raw(), 7282);
    }

    #[test]
    fn far_and_beyond_are_invalid() {
        assert_eq!(encode_depth(10.0, range()), DepthCode::Invalid);
        assert_eq!(encode_depth(1.0e6, range()), DepthCode::Invalid);
        assert_eq!(encode_depth(f32::INFINITY, range()), DepthCode::Invalid);
        assert_eq!(encode_depth(f32::NAN, range()), DepthCode::Invalid);
    }

    #[test]
    fn closer_than_near_saturates() {
        assert_eq!(encode_depth(1.0, range()).to_raw(), 65535);
        assert_eq!(encode_depth(0.5, range()).to_raw(), 65535);
    }

    #[test]
    fn codes_decrease_with_depth() {
        let mut previous = encode_depth(1.0, range()).to_raw();
        for step in 1..90 {
            let d = 1.0 + step as f32 * 0.1;
            let code = encode_depth(d, range()).to_raw();
            assert!(code < previous, "code for d={d} should drop below {previous}");
            previous = code;
        }
    }

    #[test]
    fn decode_inverts_encode() {
        for &d in &[1.0f32, 1.5, 2.0, 3.3, 5.0, 7.75, 9.9] {
            let decoded = decode_depth(encode_depth(d, range()), range());
            // 16 bits of inverse depth over [1, 10): worst-case step stays well under 1%.
            assert!(
                (decoded - d).abs() / d < 1.0e-2,
                "round trip of {d} gave {decoded}"
            );
        }
        assert_eq!(decode_depth(DepthCode::Invalid, range()), f32::INFINITY);
    }

    #[test]
    fn plane_round_trip_marks_holes() {
        let depth = Plane::from_raw(2, 2, vec![5.0, 10.0, 2.0, 42.0]).unwrap();
        let quantized = quantize_plane(&depth, range());
        assert_eq!(quantized.get(1, 0), 0);
        assert_eq!(quantized.get(1, 1), 0);
        assert_ne!(quantized.get(0, 0), 0);

        let restored = dequantize_plane(&quantized, range());
        assert_eq!(restored.get(1, 0), f32::INFINITY);
        assert!((restored.get(0, 0) - 5.0).abs() < 0.05);
    }
}
