//! Rasterization of a selection into the exported bitmap.
//!
//! # Algorithm
//!
//! The selection is stored in percent of the unscaled displayed box, while the
//! user dragged over an image magnified by `zoom`. Export folds the zoom back in:
//!
//! ```text
//! out_w = crop.width  / 100 * natural_w          (unaffected by zoom)
//! out_h = crop.height / 100 * natural_h
//! src_x = crop.x / 100 * natural_w / zoom
//! src_y = crop.y / 100 * natural_h / zoom
//! src_w = out_w / zoom,  src_h = out_h / zoom
//! ```
//!
//! Every output pixel center is mapped back into the source rectangle and
//! sampled (inverse mapping). Samples that land outside the source image are
//! transparent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::RasterImage;
use crate::encode::{encode_png, non_empty, EncodeError};
use crate::export::{CancelToken, ExportedImage};
use crate::CropRect;

/// Errors raised while planning or running an export.
#[derive(Debug, Error)]
pub enum RasterError {
    /// Zoom scale was zero, negative or not finite
    #[error("Invalid zoom scale: {scale} (must be finite and greater than zero)")]
    InvalidZoomScale { scale: f64 },

    /// Encoding the output bitmap failed
    #[error("Export failed: {0}")]
    Encode(#[from] EncodeError),

    /// The export was cancelled before it completed
    #[error("Export cancelled")]
    Cancelled,
}

/// Sampling filter used when the source extent differs from the output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationFilter {
    /// Nearest source pixel.
    Nearest,
    /// Weighted average of the four nearest pixels.
    #[default]
    Bilinear,
}

/// Source rectangle (natural pixels, fractional allowed) and output size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterPlan {
    pub source_x: f64,
    pub source_y: f64,
    pub source_width: f64,
    pub source_height: f64,
    pub output_width: u32,
    pub output_height: u32,
}

impl RasterPlan {
    /// Source pixels covered by one output pixel, per axis.
    pub fn sample_step(&self) -> (f64, f64) {
        (
            self.source_width / self.output_width as f64,
            self.source_height / self.output_height as f64,
        )
    }
}

/// Reject zoom scales the rasterizer cannot divide by.
pub fn validate_zoom(zoom_scale: f64) -> Result<f64, RasterError> {
    if zoom_scale.is_finite() && zoom_scale > 0.0 {
        Ok(zoom_scale)
    } else {
        Err(RasterError::InvalidZoomScale { scale: zoom_scale })
    }
}

/// Map a selection and zoom onto natural-resolution pixels.
///
/// # Arguments
///
/// * `crop` - Selection in percent of the displayed box
/// * `zoom_scale` - Visual zoom at the time of export, must be > 0
/// * `natural` - Natural (width, height) of the source image
///
/// # Example
///
/// ```ignore
/// let plan = plan_raster(&CropRect::new(25.0, 25.0, 50.0, 50.0), 2.0, (1000, 500))?;
/// assert_eq!((plan.source_x, plan.source_y), (125.0, 62.5));
/// assert_eq!((plan.output_width, plan.output_height), (500, 250));
/// ```
pub fn plan_raster(
    crop: &CropRect,
    zoom_scale: f64,
    natural: (u32, u32),
) -> Result<RasterPlan, RasterError> {
    let zoom = validate_zoom(zoom_scale)?;
    let (natural_w, natural_h) = (natural.0 as f64, natural.1 as f64);

    let out_w = crop.width / 100.0 * natural_w;
    let out_h = crop.height / 100.0 * natural_h;

    let output_width = (out_w.round() as u32).max(1);
    let output_height = (out_h.round() as u32).max(1);

    Ok(RasterPlan {
        source_x: crop.x / 100.0 * natural_w / zoom,
        source_y: crop.y / 100.0 * natural_h / zoom,
        source_width: out_w / zoom,
        source_height: out_h / zoom,
        output_width,
        output_height,
    })
}

/// Rasterize a selection of `source` and encode it as PNG.
///
/// # Arguments
///
/// * `source` - Decoded image at natural resolution
/// * `crop` - Last valid selection
/// * `zoom_scale` - Visual zoom at the time of export, must be > 0
/// * `filter` - Sampling filter
/// * `cancel` - Checked once per output row and before encoding
///
/// # Errors
///
/// * `RasterError::InvalidZoomScale` before any work if the zoom is unusable
/// * `RasterError::Cancelled` if `cancel` fires mid-export
/// * `RasterError::Encode` if encoding fails or produces no bytes
pub fn rasterize(
    source: &RasterImage,
    crop: &CropRect,
    zoom_scale: f64,
    filter: InterpolationFilter,
    cancel: &CancelToken,
) -> Result<ExportedImage, RasterError> {
    rasterize_with(source, crop, zoom_scale, filter, cancel, encode_bitmap)
}

/// Lossless PNG encoding of an output bitmap.
pub(crate) fn encode_bitmap(bitmap: &RasterImage) -> Result<Vec<u8>, EncodeError> {
    encode_png(&bitmap.pixels, bitmap.width, bitmap.height)
}

/// [`rasterize`] with the encoder supplied by the caller.
pub(crate) fn rasterize_with<E>(
    source: &RasterImage,
    crop: &CropRect,
    zoom_scale: f64,
    filter: InterpolationFilter,
    cancel: &CancelToken,
    encode: E,
) -> Result<ExportedImage, RasterError>
where
    E: FnOnce(&RasterImage) -> Result<Vec<u8>, EncodeError>,
{
    let plan = plan_raster(crop, zoom_scale, source.dimensions())?;
    let bitmap = draw(source, &plan, filter, cancel)?;

    if cancel.is_cancelled() {
        return Err(RasterError::Cancelled);
    }

    let encoded = non_empty(encode(&bitmap)?)?;
    tracing::info!(
        width = bitmap.width,
        height = bitmap.height,
        bytes = encoded.len(),
        zoom = zoom_scale,
        "Crop rasterized"
    );
    Ok(ExportedImage::new(bitmap, encoded))
}

/// Draw the plan's source rectangle into a fresh target of the output size.
fn draw(
    source: &RasterImage,
    plan: &RasterPlan,
    filter: InterpolationFilter,
    cancel: &CancelToken,
) -> Result<RasterImage, RasterError> {
    let (out_w, out_h) = (plan.output_width, plan.output_height);
    let (step_x, step_y) = plan.sample_step();
    let mut output = RasterImage::transparent(out_w, out_h);

    if source.is_empty() {
        return Ok(output);
    }

    let row_len = out_w as usize * RasterImage::CHANNELS;
    for (dst_y, row) in output.pixels.chunks_exact_mut(row_len).enumerate() {
        if cancel.is_cancelled() {
            return Err(RasterError::Cancelled);
        }

        // Pixel centers map to pixel centers
        let src_y = plan.source_y + (dst_y as f64 + 0.5) * step_y - 0.5;

        for (dst_x, pixel) in row.chunks_exact_mut(RasterImage::CHANNELS).enumerate() {
            let src_x = plan.source_x + (dst_x as f64 + 0.5) * step_x - 0.5;
            let sample = match filter {
                InterpolationFilter::Nearest => sample_nearest(source, src_x, src_y),
                InterpolationFilter::Bilinear => sample_bilinear(source, src_x, src_y),
            };
            pixel.copy_from_slice(&sample);
        }
    }

    Ok(output)
}

/// True when (x, y) falls on the source image, pixel edges included.
#[inline]
fn inside(image: &RasterImage, x: f64, y: f64) -> bool {
    x >= -0.5 && y >= -0.5 && x < image.width as f64 - 0.5 && y < image.height as f64 - 0.5
}

fn sample_nearest(image: &RasterImage, x: f64, y: f64) -> [u8; 4] {
    if !inside(image, x, y) {
        return [0; 4];
    }
    let px = ((x + 0.5).floor() as i64).clamp(0, image.width as i64 - 1) as u32;
    let py = ((y + 0.5).floor() as i64).clamp(0, image.height as i64 - 1) as u32;
    image.pixel(px, py)
}

/// Bilinear interpolation over the four nearest pixels, edges clamped.
fn sample_bilinear(image: &RasterImage, x: f64, y: f64) -> [u8; 4] {
    if !inside(image, x, y) {
        return [0; 4];
    }

    let max_x = image.width as i64 - 1;
    let max_y = image.height as i64 - 1;

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let ix0 = (x0 as i64).clamp(0, max_x) as u32;
    let iy0 = (y0 as i64).clamp(0, max_y) as u32;
    let ix1 = (x0 as i64 + 1).clamp(0, max_x) as u32;
    let iy1 = (y0 as i64 + 1).clamp(0, max_y) as u32;

    // Exact pixel centers copy through untouched
    if fx == 0.0 && fy == 0.0 {
        return image.pixel(ix0, iy0);
    }

    let p00 = image.pixel(ix0, iy0);
    let p10 = image.pixel(ix1, iy0);
    let p01 = image.pixel(ix0, iy1);
    let p11 = image.pixel(ix1, iy1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        let value = top * (1.0 - fy) + bottom * fy;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn crop_strategy() -> impl Strategy<Value = CropRect> {
        (0.0f64..=90.0, 0.0f64..=90.0, 1.0f64..=10.0, 1.0f64..=10.0)
            .prop_map(|(x, y, w, h)| CropRect::new(x, y, w, h))
    }

    proptest! {
        /// Property: Output size never depends on zoom.
        #[test]
        fn prop_output_size_ignores_zoom(
            crop in crop_strategy(),
            (nw, nh) in (1u32..=4000, 1u32..=4000),
            zoom in 0.1f64..=5.0,
        ) {
            let base = plan_raster(&crop, 1.0, (nw, nh)).unwrap();
            let zoomed = plan_raster(&crop, zoom, (nw, nh)).unwrap();
            prop_assert_eq!(base.output_width, zoomed.output_width);
            prop_assert_eq!(base.output_height, zoomed.output_height);
        }

        /// Property: Source offset is the unzoomed offset divided by the zoom.
        #[test]
        fn prop_source_offset_divides_by_zoom(
            crop in crop_strategy(),
            (nw, nh) in (1u32..=4000, 1u32..=4000),
            zoom in 0.1f64..=5.0,
        ) {
            let base = plan_raster(&crop, 1.0, (nw, nh)).unwrap();
            let zoomed = plan_raster(&crop, zoom, (nw, nh)).unwrap();
            prop_assert!((zoomed.source_x * zoom - base.source_x).abs() < 1e-6);
            prop_assert!((zoomed.source_y * zoom - base.source_y).abs() < 1e-6);
        }

        /// Property: Non-positive zoom never reaches the division.
        #[test]
        fn prop_non_positive_zoom_rejected(zoom in -10.0f64..=0.0) {
            let result = plan_raster(&CropRect::FULL, zoom, (10, 10));
            let rejected = matches!(result, Err(RasterError::InvalidZoomScale { .. }));
            prop_assert!(rejected);
        }

        /// Property: Full crops at zoom 1 reproduce the source exactly.
        #[test]
        fn prop_full_crop_is_identity(
            (w, h) in (1u32..=24, 1u32..=24),
            filter in prop_oneof![Just(InterpolationFilter::Nearest), Just(InterpolationFilter::Bilinear)],
        ) {
            let pixels: Vec<u8> = (0..(w * h * 4)).map(|i| (i * 31 % 256) as u8).collect();
            let img = RasterImage::new(w, h, pixels);
            let out = rasterize(&img, &CropRect::FULL, 1.0, filter, &CancelToken::new()).unwrap();
            prop_assert_eq!(out.dimensions(), (w, h));
            prop_assert_eq!(&out.bitmap().pixels, &img.pixels);
        }
    }
}
