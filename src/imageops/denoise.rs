//! Depth-guided bilateral denoising of panoramic color buffers.

use std::f32::consts::PI;

use crate::buffer::{ColorPlanes, Plane};
use crate::error::{PanoError, PanoResult, ParameterError, ParameterErrorKind};

/// The kernel constant: variance term and normalization divisor of the spatial Gaussian.
///
/// Reusing `2π` for both is unusual but deliberate; outputs must stay compatible with
/// buffers produced by earlier versions of the pipeline.
const TWO_PI: f32 = 2.0 * PI;

/// Weight of the always-included center sample.
const CENTER_WEIGHT: f32 = 1.0 / TWO_PI;

/// Immutable inputs shared by all rows of one denoise call.
struct SrcView<'a> {
    r: &'a [f32],
    g: &'a [f32],
    b: &'a [f32],
    depth: &'a [f32],
    width: usize,
    height: usize,
    kernel: &'a [(i64, i64, f32)],
    threshold: f32,
}

/// Denoise a color buffer guided by its depth buffer, preserving depth discontinuities.
///
/// Each output pixel is a Gaussian-weighted average over the window
/// `[-radius, radius)` × `[-radius, radius)` around it. A neighbor contributes only if its
/// depth is within `depth_threshold` of the center depth (a hard cutoff, not a soft range
/// kernel). Columns wrap horizontally for equirectangular seam continuity; rows do not wrap
/// past the poles. The window intentionally spans one fewer sample on the positive side
/// than the negative side.
///
/// With `radius == 0` the output equals the input exactly.
pub fn denoise(
    color: &ColorPlanes,
    depth: &Plane<f32>,
    radius: u32,
    depth_threshold: f32,
) -> PanoResult<ColorPlanes> {
    if color.dimensions() != depth.dimensions() {
        return Err(PanoError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        )));
    }
    if !(depth_threshold > 0.0) || !depth_threshold.is_finite() {
        return Err(PanoError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::Generic("depth threshold must be positive and finite".into()),
        )));
    }

    let (width, height) = color.dimensions();
    if width == 0 || height == 0 {
        return Ok(color.clone());
    }

    let radius = i64::from(radius);
    let kernel: Vec<(i64, i64, f32)> = (-radius..radius)
        .flat_map(|dy| (-radius..radius).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| (dx, dy) != (0, 0))
        .map(|(dx, dy)| {
            let dist = (dx * dx + dy * dy) as f32;
            (dx, dy, (-dist / TWO_PI).exp() / TWO_PI)
        })
        .collect();

    let src = SrcView {
        r: color.r().as_raw(),
        g: color.g().as_raw(),
        b: color.b().as_raw(),
        depth: depth.as_raw(),
        width: width as usize,
        height: height as usize,
        kernel: &kernel,
        threshold: depth_threshold,
    };

    let len = src.width * src.height;
    let mut out_r = vec![0f32; len];
    let mut out_g = vec![0f32; len];
    let mut out_b = vec![0f32; len];
    for_each_row(&mut out_r, &mut out_g, &mut out_b, &src);

    ColorPlanes::new(
        Plane::from_raw(width, height, out_r).expect("output plane matches input dimensions"),
        Plane::from_raw(width, height, out_g).expect("output plane matches input dimensions"),
        Plane::from_raw(width, height, out_b).expect("output plane matches input dimensions"),
    )
}

#[cfg(feature = "rayon")]
fn for_each_row(out_r: &mut [f32], out_g: &mut [f32], out_b: &mut [f32], src: &SrcView<'_>) {
    use rayon::prelude::*;

    out_r
        .par_chunks_exact_mut(src.width)
        .zip(out_g.par_chunks_exact_mut(src.width))
        .zip(out_b.par_chunks_exact_mut(src.width))
        .enumerate()
        .for_each(|(y, ((row_r, row_g), row_b))| denoise_row(y, row_r, row_g, row_b, src));
}

#[cfg(not(feature = "rayon"))]
fn for_each_row(out_r: &mut [f32], out_g: &mut [f32], out_b: &mut [f32], src: &SrcView<'_>) {
    out_r
        .chunks_exact_mut(src.width)
        .zip(out_g.chunks_exact_mut(src.width))
        .zip(out_b.chunks_exact_mut(src.width))
        .enumerate()
        .for_each(|(y, ((row_r, row_g), row_b))| denoise_row(y, row_r, row_g, row_b, src));
}

fn denoise_row(y: usize, row_r: &mut [f32], row_g: &mut [f32], row_b: &mut [f32], src: &SrcView<'_>) {
    for x in 0..src.width {
        let center = y * src.width + x;
        let center_depth = src.depth[center];

        let mut weight = 0f32;
        let mut sum_r = 0f32;
        let mut sum_g = 0f32;
        let mut sum_b = 0f32;
        for &(dx, dy, w) in src.kernel {
            let py = y as i64 + dy;
            if py < 0 || py >= src.height as i64 {
                continue;
            }
            let px = (x as i64 + dx).rem_euclid(src.width as i64) as usize;
            let idx = py as usize * src.width + px;
            if (src.depth[idx] - center_depth).abs() < src.threshold {
                weight += w;
                sum_r += w * src.r[idx];
                sum_g += w * src.g[idx];
                sum_b += w * src.b[idx];
            }
        }

        if weight == 0.0 {
            row_r[x] = src.r[center];
            row_g[x] = src.g[center];
            row_b[x] = src.b[center];
        } else {
            let total = CENTER_WEIGHT + weight;
            row_r[x] = (CENTER_WEIGHT * src.r[center] + sum_r) / total;
            row_g[x] = (CENTER_WEIGHT * src.g[center] + sum_g) / total;
            row_b[x] = (CENTER_WEIGHT * src.b[center] + sum_b) / total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_view(width: u32, height: u32, value: f32) -> (ColorPlanes, Plane<f32>) {
        let plane = Plane::from_pixel(width, height, value);
        let color = ColorPlanes::new(plane.clone(), plane.clone(), plane).unwrap();
        (color, Plane::from_pixel(width, height, 5.0))
    }

    #[test]
    fn radius_zero_is_identity() {
        let data: Vec<f32> = (0..16).map(|i| i as f32 * 0.25).collect();
        let plane = Plane::from_raw(4, 4, data).unwrap();
        let color = ColorPlanes::new(plane.clone(), plane.clone(), plane).unwrap();
        let depth = Plane::from_pixel(4, 4, 5.0);

        let out = denoise(&color, &depth, 0, 0.1).unwrap();
        assert_eq!(out, color);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let (color, _) = uniform_view(4, 4, 1.0);
        let depth = Plane::from_pixel(4, 5, 5.0);
        assert!(denoise(&color, &depth, 1, 0.1).is_err());
    }

    #[test]
    fn nonpositive_threshold_is_an_error() {
        let (color, depth) = uniform_view(4, 4, 1.0);
        assert!(denoise(&color, &depth, 1, 0.0).is_err());
        assert!(denoise(&color, &depth, 1, -1.0).is_err());
    }

    #[test]
    fn columns_wrap_horizontally() {
        // Uniform depth; only the last column differs in color. Its contribution must
        // reach x = 0 through the seam.
        let (_, depth) = uniform_view(4, 4, 0.0);
        let mut plane = Plane::from_pixel(4, 4, 0f32);
        for y in 0..4 {
            plane.put(3, y, 1.0);
        }
        let color = ColorPlanes::new(plane.clone(), plane.clone(), plane).unwrap();

        let out = denoise(&color, &depth, 1, 0.5).unwrap();
        for y in 0..4 {
            assert!(
                out.r().get(0, y) > 0.0,
                "wrapped neighbor should brighten (0, {y})"
            );
        }
    }

    #[test]
    fn rows_do_not_wrap_vertically() {
        // Only the bottom row differs; the top row must not see it through the pole.
        let (_, depth) = uniform_view(4, 4, 0.0);
        let mut plane = Plane::from_pixel(4, 4, 0f32);
        for x in 0..4 {
            plane.put(x, 3, 1.0);
        }
        let color = ColorPlanes::new(plane.clone(), plane.clone(), plane).unwrap();

        let out = denoise(&color, &depth, 1, 0.5).unwrap();
        for x in 0..4 {
            assert_eq!(out.g().get(x, 0), 0.0);
        }
    }

    #[test]
    fn window_is_asymmetric() {
        // radius = 1 visits offsets (-1,-1), (0,-1), (-1,0) only: the neighbor to the
        // right of the center must not contribute.
        let (_, depth) = uniform_view(5, 5, 0.0);
        let mut plane = Plane::from_pixel(5, 5, 0f32);
        plane.put(3, 2, 1.0);
        let color = ColorPlanes::new(plane.clone(), plane.clone(), plane).unwrap();

        let out = denoise(&color, &depth, 1, 0.5).unwrap();
        // (2, 2) has the bright pixel on its positive-x side: excluded by the window.
        assert_eq!(out.b().get(2, 2), 0.0);
        // (4, 2) has it on its negative-x side: included.
        assert!(out.b().get(4, 2) > 0.0);
    }

    #[test]
    fn depth_gate_preserves_discontinuities() {
        // Two flat regions at very different depths; colors must not bleed across.
        let mut depth = Plane::from_pixel(4, 4, 1.0);
        let mut plane = Plane::from_pixel(4, 4, 0f32);
        for y in 0..4 {
            for x in 2..4 {
                depth.put(x, y, 9.0);
                plane.put(x, y, 1.0);
            }
        }
        let color = ColorPlanes::new(plane.clone(), plane.clone(), plane).unwrap();

        let out = denoise(&color, &depth, 2, 0.5).unwrap();
        for y in 0..4 {
            assert_eq!(out.r().get(1, y), 0.0, "no bleed into (1, {y})");
            assert_eq!(out.r().get(2, y), 1.0, "no bleed into (2, {y})");
        }
    }

    #[test]
    fn uniform_regions_stay_uniform() {
        let (color, depth) = uniform_view(6, 6, 0.75);
        let out = denoise(&color, &depth, 2, 0.5).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                assert!((out.r().get(x, y) - 0.75).abs() < 1.0e-6);
            }
        }
    }
}
