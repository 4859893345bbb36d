//! Extraction and compression of panoramic color/depth assets.
//!
//! This crate turns multi-channel HDR panorama containers into compact, streamable
//! assets. It pulls per-view color and depth planes out of OpenEXR files, cleans the
//! color up with a depth-guided bilateral filter, tone maps it into 8-bit sRGB previews,
//! and packs the depth into a lossless RVL (run-length + variable-length) container.
//!
//! # Overview
//!
//! * [`openexr::read_views`] extracts named views from a container file.
//! * [`imageops::denoise`] removes render noise while preserving depth discontinuities.
//! * [`imageops::tonemap_rgba`] produces an RGBA8 preview buffer, written out through
//!   [`export::write_png_file`].
//! * [`quantize_plane`] maps linear depth to 16-bit inverse-depth codes, which
//!   [`codecs::rvl::write_rvl_file`] compresses into an `"RVL\n"` container.
//!
//! ```no_run
//! use panodepth::codecs::rvl::write_rvl_file;
//! use panodepth::imageops::{denoise, tonemap_rgba, ToneCurve};
//! use panodepth::{export, quantize_plane, read_views, DepthRange};
//!
//! # fn main() -> panodepth::PanoResult<()> {
//! let set = read_views("office_cdep_4096x2048.exr")?;
//! let range = match set.depth_range {
//!     Some(range) => range,
//!     None => DepthRange::new(0.1, 50.0)?,
//! };
//!
//! for view in &set.views {
//!     let Some(depth) = &view.depth else { continue };
//!     let color = denoise(&view.color, depth, 2, 0.35)?;
//!     let (width, height) = color.dimensions();
//!
//!     let rgba = tonemap_rgba(&color, ToneCurve::default());
//!     export::write_png_file(format!("{}.png", view.name), &rgba, width, height)?;
//!     write_rvl_file(format!("{}.rvl", view.name), &quantize_plane(depth, range), range)?;
//! }
//! # Ok(()) }
//! ```
//!
//! # Crate features
//!
//! * `rayon` (default): parallelize the denoiser across rows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_qualifications)]

pub use crate::buffer::{ColorPlanes, Plane};
pub use crate::channel::{ChannelId, Component};
pub use crate::error::{PanoError, PanoResult};
pub use crate::openexr::{read_views, View, ViewSet};
pub use crate::quantize::{
    decode_depth, dequantize_plane, encode_depth, quantize_plane, DepthCode, DepthRange,
};

pub mod buffer;
pub mod channel;
pub mod codecs;
pub mod error;
pub mod export;
pub mod imageops;
pub mod openexr;
pub mod quantize;
pub mod stats;
