//! Cross-module pipeline tests: quantize, compress, write, read back, compare.

use std::path::PathBuf;

use panodepth::codecs::rvl::{read_rvl_file, write_rvl_file};
use panodepth::imageops::{denoise, tonemap_rgba, ToneCurve};
use panodepth::stats::{disocclusion_hole_area, psnr, psnr_masked};
use panodepth::{dequantize_plane, quantize_plane, ColorPlanes, DepthRange, Plane};

const WIDTH: u32 = 16;
const HEIGHT: u32 = 8;

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("panodepth-{name}-{}.rvl", std::process::id()))
}

/// A small scene: a slanted wall on the left, a hole (beyond the far plane) on the right.
fn synthetic_view() -> (ColorPlanes, Plane<f32>) {
    let mut depth = Plane::from_pixel(WIDTH, HEIGHT, 0.0f32);
    let mut r = Plane::from_pixel(WIDTH, HEIGHT, 0.0f32);
    let mut g = Plane::from_pixel(WIDTH, HEIGHT, 0.0f32);
    let mut b = Plane::from_pixel(WIDTH, HEIGHT, 0.0f32);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            if x < WIDTH / 2 {
                depth.put(x, y, 2.0 + x as f32 * 0.25);
                r.put(x, y, 0.8);
                g.put(x, y, 0.5 + y as f32 * 0.01);
                b.put(x, y, 0.2);
            } else {
                depth.put(x, y, 100.0);
            }
        }
    }
    (ColorPlanes::new(r, g, b).unwrap(), depth)
}

#[test]
fn quantize_compress_write_read_round_trip() {
    let (_, depth) = synthetic_view();
    let range = DepthRange::new(1.0, 50.0).unwrap();
    let quantized = quantize_plane(&depth, range);

    // The hole half must be invalid, the wall half valid.
    for y in 0..HEIGHT {
        assert_ne!(quantized.get(0, y), 0);
        assert_eq!(quantized.get(WIDTH - 1, y), 0);
    }

    let path = temp_file("roundtrip");
    write_rvl_file(&path, &quantized, range).unwrap();
    let (restored, restored_range) = read_rvl_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(restored_range, range);
    assert_eq!(restored, quantized);

    // Decoded depth agrees with the source inside the valid range and marks the hole.
    let decoded = dequantize_plane(&restored, range);
    for y in 0..HEIGHT {
        for x in 0..WIDTH / 2 {
            let original = depth.get(x, y);
            assert!((decoded.get(x, y) - original).abs() / original < 1.0e-2);
        }
        assert_eq!(decoded.get(WIDTH - 1, y), f32::INFINITY);
    }
}

#[test]
fn denoise_then_tonemap_produces_a_full_preview() {
    let (color, depth) = synthetic_view();
    let denoised = denoise(&color, &depth, 2, 0.5).unwrap();
    assert_eq!(denoised.dimensions(), color.dimensions());

    let rgba = tonemap_rgba(&denoised, ToneCurve::default());
    assert_eq!(rgba.len(), (WIDTH * HEIGHT * 4) as usize);
    assert!(rgba.chunks_exact(4).all(|px| px[3] == 255));

    // The hole half tone maps to black; the wall half does not.
    let hole = disocclusion_hole_area(&rgba, WIDTH, HEIGHT).unwrap();
    assert!((hole.pixel_fraction - 0.5).abs() < 1.0e-9);

    // The depth gate keeps the hole black and the wall lit, so denoising only nudges
    // the wall's gradient: both PSNR variants stay high.
    let reference = tonemap_rgba(&color, ToneCurve::default());
    assert!(psnr_masked(&reference, &rgba).unwrap() > 40.0);
    assert!(psnr(&reference, &rgba).unwrap() > 40.0);
}
