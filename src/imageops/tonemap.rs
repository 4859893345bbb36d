//! Tone mapping of linear HDR color to 8-bit sRGB previews.

use num_traits::clamp;

use crate::buffer::ColorPlanes;

/// The fixed preview tone curve.
///
/// Highlights above `hdr_scale_min` are compressed toward `hdr_scale_max` before the sRGB
/// transfer; the curve's constants are fixed for compatibility with previously produced
/// previews, not tunable grading parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneCurve {
    /// Exponent of the sRGB transfer segment.
    pub gamma: f32,
    /// Linear value above which highlight compression starts.
    pub hdr_scale_min: f32,
    /// Linear value mapped to the top of the compressed highlight range.
    pub hdr_scale_max: f32,
}

impl Default for ToneCurve {
    fn default() -> ToneCurve {
        ToneCurve {
            gamma: 1.0 / 2.4,
            hdr_scale_min: 0.75,
            hdr_scale_max: 12.5,
        }
    }
}

impl ToneCurve {
    /// Map one linear sample to an 8-bit sRGB value.
    pub fn apply(&self, linear: f32) -> u8 {
        let mut linear = linear;
        if linear > self.hdr_scale_min {
            linear = ((linear - self.hdr_scale_min) / (self.hdr_scale_max - self.hdr_scale_min))
                * (1.0 - self.hdr_scale_min)
                + self.hdr_scale_min;
        }
        let mut srgb = 12.92 * linear;
        if linear > 0.003_130_8 {
            srgb = (1.055 * linear.powf(self.gamma)).min(1.0);
        }
        clamp(255.0 * srgb + 0.5, 0.0, 255.0) as u8
    }
}

/// Tone map a linear HDR color buffer into a flat RGBA8 buffer with opaque alpha.
///
/// The output is row-major `width * height * 4` bytes, ready for PNG encoding.
pub fn tonemap_rgba(color: &ColorPlanes, curve: ToneCurve) -> Vec<u8> {
    let (width, height) = color.dimensions();
    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    let (r, g, b) = (color.r().as_raw(), color.g().as_raw(), color.b().as_raw());
    for i in 0..r.len() {
        rgba.push(curve.apply(r[i]));
        rgba.push(curve.apply(g[i]));
        rgba.push(curve.apply(b[i]));
        rgba.push(255);
    }
    rgba
}

#[cfg(test)]
mod tests {
    use crate::buffer::{ColorPlanes, Plane};

    use super::*;

    #[test]
    fn dark_segment_is_linear() {
        let curve = ToneCurve::default();
        assert_eq!(curve.apply(0.0), 0);
        // 12.92 * 0.003 * 255 + 0.5 = 10.38
        assert_eq!(curve.apply(0.003), 10);
    }

    #[test]
    fn highlights_saturate() {
        let curve = ToneCurve::default();
        assert_eq!(curve.apply(100.0), 255);
        assert_eq!(curve.apply(curve.hdr_scale_max), 255);
    }

    #[test]
    fn negative_samples_clamp_to_black() {
        assert_eq!(ToneCurve::default().apply(-3.5), 0);
    }

    #[test]
    fn curve_is_monotonic() {
        let curve = ToneCurve::default();
        let mut previous = 0u8;
        for step in 0..=1300 {
            let mapped = curve.apply(step as f32 * 0.01);
            assert!(mapped >= previous);
            previous = mapped;
        }
    }

    #[test]
    fn rgba_layout_is_interleaved_and_opaque() {
        let r = Plane::from_pixel(2, 1, 0.0f32);
        let g = Plane::from_pixel(2, 1, 0.2f32);
        let b = Plane::from_pixel(2, 1, 100.0f32);
        let color = ColorPlanes::new(r, g, b).unwrap();

        let rgba = tonemap_rgba(&color, ToneCurve::default());
        assert_eq!(rgba.len(), 8);
        assert_eq!(rgba[0], 0);
        assert_eq!(rgba[2], 255);
        assert_eq!(rgba[3], 255);
        assert_eq!(rgba[4..8], rgba[..4]);
    }
}
