//! Visual zoom and pan state for the crop viewport.
//!
//! Zoom only magnifies the on-screen image. It never rewrites the stored
//! selection, which stays in percent of the unscaled displayed box; the
//! rasterizer accounts for the scale when exporting.

use serde::{Deserialize, Serialize};

use crate::config::CropConfig;
use crate::Size;

/// Scale shown when the viewport opens or zoom is reset.
pub const DEFAULT_SCALE: f64 = 1.0;

/// Scales are snapped to this grid so repeated steps don't drift.
const SCALE_GRID: f64 = 1e6;

/// Direction of a single pan action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanDirection {
    Up,
    Down,
    Left,
    Right,
}

impl PanDirection {
    /// Unit vector in screen coordinates (y grows downward).
    fn unit(self) -> (f64, f64) {
        match self {
            PanDirection::Up => (0.0, -1.0),
            PanDirection::Down => (0.0, 1.0),
            PanDirection::Left => (-1.0, 0.0),
            PanDirection::Right => (1.0, 0.0),
        }
    }
}

impl TryFrom<&str> for PanDirection {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "up" => Ok(PanDirection::Up),
            "down" => Ok(PanDirection::Down),
            "left" => Ok(PanDirection::Left),
            "right" => Ok(PanDirection::Right),
            other => Err(format!("Unknown pan direction: {other}")),
        }
    }
}

/// Scroll position of the zoomed content, in displayed pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

/// Zoom scale plus pan offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomController {
    scale: f64,
    pan: PanOffset,
    step: f64,
    min_scale: f64,
    pan_step: f64,
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::from_config(&CropConfig::default())
    }
}

impl ZoomController {
    /// Controller at scale 1.0 with the steps from `config`.
    ///
    /// Expects a validated config; non-positive steps are replaced with the
    /// defaults so the scale can never reach zero.
    pub fn from_config(config: &CropConfig) -> Self {
        let defaults = CropConfig::default();
        let pick = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        Self {
            scale: DEFAULT_SCALE,
            pan: PanOffset::default(),
            step: pick(config.zoom_step, defaults.zoom_step),
            min_scale: pick(config.min_zoom, defaults.min_zoom),
            pan_step: pick(config.pan_step, defaults.pan_step),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pan_offset(&self) -> PanOffset {
        self.pan
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.scale = snap(self.scale + self.step);
        self.scale
    }

    /// Step the scale down, never below the configured minimum.
    pub fn zoom_out(&mut self) -> f64 {
        self.scale = snap(self.scale - self.step).max(self.min_scale);
        self.scale
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.scale = DEFAULT_SCALE;
        self.pan = PanOffset::default();
        self.scale
    }

    /// Scroll by one fixed step, like `scrollBy` on the zoom container.
    ///
    /// The step does not depend on the scale. The result is clamped to the
    /// scrollable extent of the zoomed content in `viewport`.
    pub fn pan(&mut self, direction: PanDirection, viewport: Size) -> PanOffset {
        let (dx, dy) = direction.unit();
        self.pan.x += dx * self.pan_step;
        self.pan.y += dy * self.pan_step;
        self.clamp_pan(viewport)
    }

    /// Re-clamp the offset after the scale or the viewport changed.
    pub fn clamp_pan(&mut self, viewport: Size) -> PanOffset {
        let (max_x, max_y) = self.scroll_extent(viewport);
        self.pan.x = self.pan.x.clamp(0.0, max_x);
        self.pan.y = self.pan.y.clamp(0.0, max_y);
        self.pan
    }

    /// How far the zoomed content can scroll in each axis.
    pub fn scroll_extent(&self, viewport: Size) -> (f64, f64) {
        if !viewport.is_measurable() {
            return (0.0, 0.0);
        }
        let overflow = self.scale - 1.0;
        (
            (overflow * viewport.width).max(0.0),
            (overflow * viewport.height).max(0.0),
        )
    }
}

#[inline]
fn snap(value: f64) -> f64 {
    (value * SCALE_GRID).round() / SCALE_GRID
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: No sequence of zoom actions reaches zero.
        #[test]
        fn prop_scale_stays_positive(actions in prop::collection::vec(0u8..3, 0..100)) {
            let mut zoom = ZoomController::default();
            for action in actions {
                match action {
                    0 => { zoom.zoom_in(); }
                    1 => { zoom.zoom_out(); }
                    _ => { zoom.reset_zoom(); }
                }
                prop_assert!(zoom.scale() >= 0.1);
            }
        }

        /// Property: Pan offsets stay inside the scrollable extent.
        #[test]
        fn prop_pan_within_extent(
            zoom_ins in 0usize..30,
            pans in prop::collection::vec(0u8..4, 0..40),
        ) {
            let viewport = Size::new(320.0, 240.0);
            let mut zoom = ZoomController::default();
            for _ in 0..zoom_ins {
                zoom.zoom_in();
            }
            let (max_x, max_y) = zoom.scroll_extent(viewport);
            for p in pans {
                let direction = match p {
                    0 => PanDirection::Up,
                    1 => PanDirection::Down,
                    2 => PanDirection::Left,
                    _ => PanDirection::Right,
                };
                let offset = zoom.pan(direction, viewport);
                prop_assert!(offset.x >= 0.0 && offset.x <= max_x);
                prop_assert!(offset.y >= 0.0 && offset.y <= max_y);
            }
        }
    }
}
