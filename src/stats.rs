//! Batch quality statistics for synthesized panorama previews.
//!
//! These operate on the decoded RGBA8 buffers as opaque arrays; they are consumed by batch
//! drivers that aggregate over directories of rendered views.

use crate::error::{PanoError, PanoResult, ParameterError, ParameterErrorKind};

/// Disocclusion hole measurements for one over/under stereo panorama.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoleArea {
    /// Black pixels as a fraction of all pixels.
    pub pixel_fraction: f64,
    /// Hole area projected onto the unit sphere, as a fraction of the sphere's area,
    /// summed over both eyes (so the maximum is `2.0`).
    pub projected_fraction: f64,
}

fn dimension_mismatch() -> PanoError {
    PanoError::Parameter(ParameterError::from_kind(
        ParameterErrorKind::DimensionMismatch,
    ))
}

/// Peak signal-to-noise ratio between two equally sized RGBA8 buffers, in dB.
///
/// The mean squared error runs over every component, alpha included. Identical buffers
/// report `100.0`.
pub fn psnr(reference: &[u8], test: &[u8]) -> PanoResult<f64> {
    if reference.len() != test.len() || reference.is_empty() {
        return Err(dimension_mismatch());
    }
    let sq_err: u64 = reference
        .iter()
        .zip(test)
        .map(|(&a, &b)| {
            let err = i64::from(a) - i64::from(b);
            (err * err) as u64
        })
        .sum();
    let mse = sq_err as f64 / reference.len() as f64;
    Ok(psnr_from_mse(mse))
}

/// PSNR restricted to pixels the test image actually covers: pixels whose test RGB is
/// all zero (disocclusion holes) are excluded, and alpha is ignored.
///
/// Fails if the test image contains no non-black pixels.
pub fn psnr_masked(reference: &[u8], test: &[u8]) -> PanoResult<f64> {
    if reference.len() != test.len() || reference.len() % 4 != 0 || reference.is_empty() {
        return Err(dimension_mismatch());
    }
    let mut sq_err = 0u64;
    let mut num_valid = 0u64;
    for (a, b) in reference.chunks_exact(4).zip(test.chunks_exact(4)) {
        if b[0] > 0 || b[1] > 0 || b[2] > 0 {
            for c in 0..3 {
                let err = i64::from(a[c]) - i64::from(b[c]);
                sq_err += (err * err) as u64;
            }
            num_valid += 1;
        }
    }
    if num_valid == 0 {
        return Err(PanoError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::Generic("test image contains no non-black pixels".into()),
        )));
    }
    let mse = sq_err as f64 / (num_valid * 3) as f64;
    Ok(psnr_from_mse(mse))
}

fn psnr_from_mse(mse: f64) -> f64 {
    if mse == 0.0 {
        return 100.0;
    }
    20.0 * (255.0 / mse.sqrt()).log10()
}

/// Measure the disocclusion hole area of an over/under stereo equirectangular panorama.
///
/// `full_height` covers both eyes stacked vertically and must be even. Hole pixels are
/// those with RGB all zero. Rows are weighted by the spherical area of their latitude
/// band; holes are assumed to start at the left edge of each row, matching how the view
/// synthesizer leaves unfilled longitude runs.
pub fn disocclusion_hole_area(rgba: &[u8], width: u32, full_height: u32) -> PanoResult<HoleArea> {
    let expected = u64::from(width) * u64::from(full_height) * 4;
    if rgba.len() as u64 != expected {
        return Err(dimension_mismatch());
    }
    if width == 0 || full_height == 0 || full_height % 2 != 0 {
        return Err(PanoError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::Generic(
                "an over/under stereo panorama needs a positive, even height".into(),
            ),
        )));
    }
    let eye_height = full_height / 2;

    let mut hole_pixels = 0u64;
    let mut projected = 0f64;
    for i in 0..full_height {
        let row = i % eye_height;
        let lat1 = 180.0 * (f64::from(row) / f64::from(eye_height)) - 90.0;
        let lat2 = 180.0 * (f64::from(row + 1) / f64::from(eye_height)) - 90.0;

        // Rows are measured bottom-up.
        let source_row = (full_height - i - 1) as usize;
        let offset = source_row * width as usize * 4;
        let num_black = rgba[offset..offset + width as usize * 4]
            .chunks_exact(4)
            .filter(|px| px[0] == 0 && px[1] == 0 && px[2] == 0)
            .count() as u64;
        hole_pixels += num_black;

        let lon1 = -180.0;
        let lon2 = 360.0 * (num_black as f64 / f64::from(width)) - 180.0;
        projected += sphere_area_quad(lat1, lon1, lat2, lon2);
    }

    Ok(HoleArea {
        pixel_fraction: hole_pixels as f64 / (f64::from(width) * f64::from(full_height)),
        projected_fraction: projected,
    })
}

/// The surface area bounded by two parallels and two meridians, as a fraction of the unit
/// sphere's area of `4π`.
fn sphere_area_quad(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lat2) = if lat2 < lat1 { (lat2, lat1) } else { (lat1, lat2) };
    let (lon1, lon2) = if lon2 < lon1 { (lon2, lon1) } else { (lon1, lon2) };
    let height = lat2.to_radians().sin() - lat1.to_radians().sin();
    height * (lon2.to_radians() - lon1.to_radians()) / (4.0 * std::f64::consts::PI)
}
