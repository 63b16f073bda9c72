//! Export-time transforms.
//!
//! This module turns the selection kept by the crop view into pixels of the
//! source image.
//!
//! # Coordinate System
//!
//! - Input selections are percentages (0 to 100) of the displayed box
//! - Output plans are in natural pixels of the source image, fractional allowed
//! - Origin is top-left corner

mod rasterize;

pub use rasterize::{
    plan_raster, rasterize, validate_zoom, InterpolationFilter, RasterError, RasterPlan,
};
pub(crate) use rasterize::{encode_bitmap, rasterize_with};
