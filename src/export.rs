//! Writing of preview images and raw depth dumps.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::buffer::Plane;
use crate::error::{AssetFormat, EncodingError, PanoError, PanoResult};

/// Write a tone-mapped RGBA8 buffer as a PNG. The writer should be buffered.
///
/// # Panics
///
/// Panics if `rgba.len() != width * height * 4`.
#[track_caller]
pub fn write_png_rgba(w: impl Write, rgba: &[u8], width: u32, height: u32) -> PanoResult<()> {
    let expected_buffer_len = (u64::from(width) * u64::from(height)).saturating_mul(4);
    assert_eq!(
        expected_buffer_len,
        rgba.len() as u64,
        "Invalid buffer length: expected {expected_buffer_len} got {} for {width}x{height} image",
        rgba.len(),
    );

    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(png_err)?;
    writer.write_image_data(rgba).map_err(png_err)?;
    Ok(())
}

/// Write a tone-mapped RGBA8 buffer to a PNG file, replacing any existing file.
#[track_caller]
pub fn write_png_file(
    path: impl AsRef<Path>,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> PanoResult<()> {
    write_png_rgba(BufWriter::new(File::create(path)?), rgba, width, height)
}

/// Dump a linear depth plane as raw little-endian `f32` samples, row-major.
///
/// The companion format to the PNG preview: no header, exactly
/// `width * height * 4` bytes.
pub fn write_depth_raw(mut w: impl Write, depth: &Plane<f32>) -> PanoResult<()> {
    #[cfg(target_endian = "little")]
    {
        w.write_all(bytemuck::cast_slice(depth.as_raw()))?;
    }
    #[cfg(not(target_endian = "little"))]
    {
        use byteorder::{LittleEndian, WriteBytesExt};
        for &sample in depth.as_raw() {
            w.write_f32::<LittleEndian>(sample)?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Dump a linear depth plane to a raw file, replacing any existing file.
pub fn write_depth_raw_file(path: impl AsRef<Path>, depth: &Plane<f32>) -> PanoResult<()> {
    write_depth_raw(BufWriter::new(File::create(path)?), depth)
}

fn png_err(err: png::EncodingError) -> PanoError {
    PanoError::Encoding(EncodingError::new(AssetFormat::Png, err))
}
