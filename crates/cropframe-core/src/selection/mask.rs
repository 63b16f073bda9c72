//! Dimming mask around the selection.
//!
//! The mask is a single polygon in percent space: the container outline,
//! then a walk back to the left edge at the selection's top, then the
//! selection window traced in the opposite direction. Filled with either
//! the even-odd or the non-zero rule it covers everything except the window.

use serde::{Deserialize, Serialize};

use crate::CropRect;

/// A polygon vertex in percent of the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskVertex {
    pub x: f64,
    pub y: f64,
}

impl MaskVertex {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Dimming polygon for one selection.
///
/// Equality compares the window the polygon was built from as well as the
/// vertices: `x + width` can round to the same edge for selections that
/// differ by an ulp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskPolygon {
    vertices: Vec<MaskVertex>,
    window: CropRect,
}

impl MaskPolygon {
    /// The selection left clear by the mask.
    pub fn window(&self) -> CropRect {
        self.window
    }

    pub fn vertices(&self) -> &[MaskVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Render as a CSS `clip-path` value, e.g. `polygon(0% 0%, 100% 0%, ...)`.
    pub fn to_clip_path(&self) -> String {
        let points: Vec<String> = self
            .vertices
            .iter()
            .map(|v| format!("{}% {}%", v.x, v.y))
            .collect();
        format!("polygon({})", points.join(", "))
    }
}

/// Build the dimming polygon for `crop`.
pub fn mask_polygon(crop: &CropRect) -> MaskPolygon {
    let (left, top) = (crop.x, crop.y);
    let (right, bottom) = (crop.right(), crop.bottom());

    let vertices = vec![
        MaskVertex::new(0.0, 0.0),
        MaskVertex::new(100.0, 0.0),
        MaskVertex::new(100.0, 100.0),
        MaskVertex::new(0.0, 100.0),
        MaskVertex::new(0.0, 100.0),
        MaskVertex::new(0.0, top),
        MaskVertex::new(left, top),
        MaskVertex::new(left, bottom),
        MaskVertex::new(right, bottom),
        MaskVertex::new(right, top),
        MaskVertex::new(0.0, top),
    ];

    MaskPolygon {
        vertices,
        window: *crop,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
