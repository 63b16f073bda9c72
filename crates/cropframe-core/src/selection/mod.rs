//! Crop selection geometry.
//!
//! - `bounds` - default selection and the clamp that keeps drags inside the image
//! - `mask` - dimming polygon drawn around the selection
//!
//! # Coordinate System
//!
//! - All values are percentages (0 to 100) of the displayed image box
//! - Origin is top-left corner
//! - Zoom is not part of this space; see `transform::rasterize` for how it is
//!   folded in at export time

mod bounds;
mod mask;

pub use bounds::{
    clamp_to_bounds, clamp_to_bounds_with_aspect, initialize, pixel_aspect, ASPECT_TOLERANCE,
};
pub use mask::{mask_polygon, MaskPolygon, MaskVertex};
