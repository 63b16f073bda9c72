//! Cropframe Core - crop geometry and rasterization engine
//!
//! This crate provides the core of the Cropframe image cropper: the selection
//! rectangle model, the clamp algorithm that keeps it valid while the user drags,
//! zoom/pan state, the dimming mask, and the pipeline that turns a selection into
//! an exported PNG.
//!
//! The crate renders nothing. A host UI feeds it viewport measurements and user
//! actions through [`session::CropSession`] and draws whatever geometry it returns.

pub mod config;
pub mod decode;
pub mod encode;
pub mod export;
pub mod reconcile;
pub mod selection;
pub mod session;
pub mod transform;
pub mod zoom;

pub use config::{AspectLock, ConfigError, CropConfig};
pub use export::{CancelToken, ExportedImage};
pub use reconcile::{Debouncer, Remount, ResizeReconciler};
pub use selection::{clamp_to_bounds, clamp_to_bounds_with_aspect, initialize, mask_polygon};
pub use session::{CropSession, SessionError};
pub use transform::{plan_raster, rasterize, InterpolationFilter, RasterError, RasterPlan};
pub use zoom::{PanDirection, PanOffset, ZoomController};

/// Tolerance used when checking the upper-edge containment invariants.
pub const BOUNDS_EPSILON: f64 = 1e-9;

/// A width/height pair in (possibly fractional) pixels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both sides are finite and strictly positive.
    pub fn is_measurable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Crop selection in percent of the displayed image box.
///
/// All four values are percentages (0 to 100) of the displayed box, so the
/// rectangle does not depend on the image's natural resolution or on zoom.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropRect {
    /// Left edge (0 to 100)
    pub x: f64,
    /// Top edge (0 to 100)
    pub y: f64,
    /// Width (greater than 0, at most 100)
    pub width: f64,
    /// Height (greater than 0, at most 100)
    pub height: f64,
}

impl Default for CropRect {
    fn default() -> Self {
        Self::FULL
    }
}

impl CropRect {
    /// The whole displayed box.
    pub const FULL: CropRect = CropRect {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge in percent.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge in percent.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True when every field is finite and both sides are positive.
    ///
    /// Drags that fail this check are degenerate and must not reach clamping.
    pub fn has_area(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Check all containment invariants.
    ///
    /// Lower bounds and positivity are exact; the right and bottom edges may
    /// exceed 100 by at most [`BOUNDS_EPSILON`].
    pub fn is_valid(&self) -> bool {
        self.has_area()
            && self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= 100.0 + BOUNDS_EPSILON
            && self.bottom() <= 100.0 + BOUNDS_EPSILON
    }
}

/// Measurements of the image element, supplied by the host UI.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewportMetrics {
    /// On-screen width before zoom scaling
    pub displayed_width: f64,
    /// On-screen height before zoom scaling
    pub displayed_height: f64,
    /// True pixel width of the image
    pub natural_width: u32,
    /// True pixel height of the image
    pub natural_height: u32,
}

impl ViewportMetrics {
    pub fn new(displayed: Size, natural_width: u32, natural_height: u32) -> Self {
        Self {
            displayed_width: displayed.width,
            displayed_height: displayed.height,
            natural_width,
            natural_height,
        }
    }

    pub fn displayed(&self) -> Size {
        Size::new(self.displayed_width, self.displayed_height)
    }

    pub fn natural(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    /// Width over height of the natural image, if it has one.
    pub fn natural_aspect(&self) -> Option<f64> {
        if self.natural_width == 0 || self.natural_height == 0 {
            return None;
        }
        Some(self.natural_width as f64 / self.natural_height as f64)
    }

    /// True when the displayed box can be used for pixel-space conversions.
    pub fn is_measurable(&self) -> bool {
        self.displayed().is_measurable()
    }

    /// Same natural dimensions, new displayed box.
    pub fn with_displayed(&self, displayed: Size) -> Self {
        Self::new(displayed, self.natural_width, self.natural_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_crop_is_valid() {
        assert!(CropRect::FULL.is_valid());
        assert_eq!(CropRect::default(), CropRect::FULL);
    }

    #[test]
    fn test_crop_edges() {
        let crop = CropRect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(crop.right(), 40.0);
        assert_eq!(crop.bottom(), 60.0);
    }

    #[test]
    fn test_crop_invalid_cases() {
        assert!(!CropRect::new(-1.0, 0.0, 50.0, 50.0).is_valid());
        assert!(!CropRect::new(0.0, 0.0, 0.0, 50.0).is_valid());
        assert!(!CropRect::new(60.0, 0.0, 50.0, 50.0).is_valid());
        assert!(!CropRect::new(0.0, 0.0, f64::NAN, 50.0).is_valid());
    }

    #[test]
    fn test_crop_has_area() {
        assert!(CropRect::new(-5.0, 200.0, 1.0, 1.0).has_area());
        assert!(!CropRect::new(0.0, 0.0, 10.0, -1.0).has_area());
        assert!(!CropRect::new(f64::INFINITY, 0.0, 10.0, 10.0).has_area());
    }

    #[test]
    fn test_size_measurable() {
        assert!(Size::new(640.0, 480.5).is_measurable());
        assert!(!Size::new(0.0, 480.0).is_measurable());
        assert!(!Size::new(640.0, f64::NAN).is_measurable());
    }

    #[test]
    fn test_viewport_natural_aspect() {
        let metrics = ViewportMetrics::new(Size::new(500.0, 250.0), 1000, 500);
        assert_eq!(metrics.natural_aspect(), Some(2.0));
        assert_eq!(metrics.natural(), (1000, 500));

        let empty = ViewportMetrics::new(Size::new(500.0, 250.0), 0, 500);
        assert_eq!(empty.natural_aspect(), None);
    }

    #[test]
    fn test_viewport_with_displayed() {
        let metrics = ViewportMetrics::new(Size::new(500.0, 250.0), 1000, 500);
        let resized = metrics.with_displayed(Size::new(800.0, 400.0));
        assert_eq!(resized.displayed(), Size::new(800.0, 400.0));
        assert_eq!(resized.natural(), (1000, 500));
    }
}
