//! Extraction of per-view color and depth planes from multi-channel OpenEXR containers.
//!
//! A container holds any number of views, each spread across channels named by the grammar
//! in [`crate::channel`]. Channels are scanned once, grouped by view, and returned as fully
//! populated buffers; a view with a partial color triple is an error rather than a silently
//! incomplete record. Camera near/far metadata travels in a JSON `"Note"` header attribute.

use std::collections::BTreeMap;
use std::path::Path;

use exr::meta::attribute::AttributeValue;
use exr::prelude::*;

use crate::buffer::{ColorPlanes, Plane};
use crate::channel::{ChannelId, Component};
use crate::error::{
    AssetFormat, DecodingError, LimitError, LimitErrorKind, PanoError, PanoResult,
    UnsupportedError, UnsupportedErrorKind,
};
use crate::quantize::DepthRange;

/// One extracted view: a complete color buffer and, if the container carries one, the
/// matching linear depth buffer.
#[derive(Clone, Debug)]
pub struct View {
    /// The view name; bare `R`/`G`/`B`/`Z` channels map to `"DEFAULT"`.
    pub name: String,
    /// The view's color channels.
    pub color: ColorPlanes,
    /// The view's linear depth plane, when present.
    pub depth: Option<Plane<f32>>,
}

/// Everything extracted from one container file.
#[derive(Clone, Debug)]
pub struct ViewSet {
    /// The contained views, ordered by name.
    pub views: Vec<View>,
    /// Camera near/far planes from the `"Note"` attribute, when present.
    pub depth_range: Option<DepthRange>,
}

#[derive(Default)]
struct PartialView {
    r: Option<Plane<f32>>,
    g: Option<Plane<f32>>,
    b: Option<Plane<f32>>,
    depth: Option<Plane<f32>>,
}

/// Read a container file and extract every view it holds.
///
/// Channels whose names fall outside the view grammar belong to no view and are skipped.
/// A recognized channel with 32-bit integer samples fails with
/// [`UnsupportedErrorKind::PixelEncoding`]; a view missing part of its color triple fails
/// with a decoding error.
pub fn read_views(path: impl AsRef<Path>) -> PanoResult<ViewSet> {
    let image = read_first_flat_layer_from_file(path).map_err(to_pano_err)?;
    let layer = &image.layer_data;

    let Vec2(width, height) = layer.size;
    let (width, height) = (to_dimension(width)?, to_dimension(height)?);

    let mut partial: BTreeMap<String, PartialView> = BTreeMap::new();
    for channel in &layer.channel_data.list {
        let name = channel.name.to_string();
        let Some(id) = ChannelId::parse(&name) else {
            continue;
        };
        let plane = plane_from_samples(&channel.sample_data, width, height, &name)?;
        let entry = partial.entry(id.view().to_owned()).or_default();
        match id {
            ChannelId::Color { component, .. } | ChannelId::LegacyColor(component) => {
                match component {
                    Component::R => entry.r = Some(plane),
                    Component::G => entry.g = Some(plane),
                    Component::B => entry.b = Some(plane),
                }
            }
            ChannelId::Depth { .. } | ChannelId::LegacyDepth => entry.depth = Some(plane),
        }
    }

    let depth_range = read_depth_range(&image)?;

    let mut views = Vec::with_capacity(partial.len());
    for (name, view) in partial {
        let (Some(r), Some(g), Some(b)) = (view.r, view.g, view.b) else {
            return Err(PanoError::Decoding(DecodingError::new(
                AssetFormat::Exr,
                format!("view '{name}' is missing part of its R/G/B color triple"),
            )));
        };
        views.push(View {
            name,
            color: ColorPlanes::new(r, g, b)?,
            depth: view.depth,
        });
    }

    Ok(ViewSet { views, depth_range })
}

fn to_dimension(size: usize) -> PanoResult<u32> {
    u32::try_from(size)
        .map_err(|_| PanoError::Limits(LimitError::from_kind(LimitErrorKind::DimensionError)))
}

fn plane_from_samples(
    samples: &FlatSamples,
    width: u32,
    height: u32,
    name: &str,
) -> PanoResult<Plane<f32>> {
    let data: Vec<f32> = match samples {
        FlatSamples::F16(values) => values.iter().map(|sample| sample.to_f32()).collect(),
        FlatSamples::F32(values) => values.clone(),
        FlatSamples::U32(_) => {
            return Err(PanoError::Unsupported(UnsupportedError::from_format_and_kind(
                AssetFormat::Exr,
                UnsupportedErrorKind::PixelEncoding(format!(
                    "channel '{name}' holds 32-bit integer samples"
                )),
            )))
        }
    };
    Plane::from_raw(width, height, data).ok_or_else(|| {
        PanoError::Decoding(DecodingError::new(
            AssetFormat::Exr,
            format!("channel '{name}' sample count does not match {width}x{height}"),
        ))
    })
}

/// Camera metadata is a JSON object in the `"Note"` attribute, e.g.
/// `{"near": 0.1, "far": 50.0}`. A missing attribute or absent keys yield `None`; a `Note`
/// that is not valid JSON is a decoding error.
fn read_depth_range(image: &Image<Layer<AnyChannels<FlatSamples>>>) -> PanoResult<Option<DepthRange>> {
    let note = image
        .layer_data
        .attributes
        .other
        .iter()
        .chain(image.attributes.other.iter())
        .find(|(name, _)| name.to_string() == "Note")
        .map(|(_, value)| value);

    let Some(AttributeValue::Text(text)) = note else {
        return Ok(None);
    };

    let meta: serde_json::Value = serde_json::from_str(&text.to_string())
        .map_err(|err| PanoError::Decoding(DecodingError::new(AssetFormat::Exr, err)))?;
    match (
        meta.get("near").and_then(serde_json::Value::as_f64),
        meta.get("far").and_then(serde_json::Value::as_f64),
    ) {
        (Some(near), Some(far)) => Ok(Some(DepthRange::new(near as f32, far as f32)?)),
        _ => Ok(None),
    }
}

fn to_pano_err(exr_error: Error) -> PanoError {
    PanoError::Decoding(DecodingError::new(AssetFormat::Exr, exr_error.to_string()))
}
