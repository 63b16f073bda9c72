//! Selection rectangle initialization and bounds clamping.
//!
//! Rectangles live in percent space, but containment is enforced in displayed
//! pixel space: the candidate is converted to pixels, its size is clamped to the
//! displayed box, it is re-placed about its own center and pushed back inside,
//! then converted back to percentages.

use crate::{CropRect, Size, ViewportMetrics};

/// Relative tolerance for aspect-ratio comparisons.
pub const ASPECT_TOLERANCE: f64 = 1e-6;

/// Build the default selection for a freshly measured image.
///
/// The rectangle is centered on the displayed box and fills it. With an
/// aspect ratio, the dominant axis is shrunk so that the rectangle's
/// displayed-pixel width over height equals `aspect_ratio`.
///
/// Unmeasurable metrics and invalid ratios fall back to the full box and to
/// no ratio respectively.
pub fn initialize(metrics: &ViewportMetrics, aspect_ratio: Option<f64>) -> CropRect {
    let displayed = metrics.displayed();
    if !displayed.is_measurable() {
        return CropRect::FULL;
    }

    let Some(aspect) = aspect_ratio.filter(|r| is_valid_ratio(*r)) else {
        return CropRect::FULL;
    };

    let mut width_px = displayed.width;
    let mut height_px = width_px / aspect;
    if height_px > displayed.height {
        height_px = displayed.height;
        width_px = height_px * aspect;
    }

    let width = (width_px / displayed.width * 100.0).min(100.0);
    let height = (height_px / displayed.height * 100.0).min(100.0);
    let crop = settle_edges(CropRect::new(
        (100.0 - width) / 2.0,
        (100.0 - height) / 2.0,
        width,
        height,
    ));

    tracing::debug!(?crop, aspect, "Initialized crop selection");
    crop
}

/// Clamp a candidate rectangle into the displayed box.
///
/// The output satisfies every `CropRect` invariant, with the right and bottom
/// edges at or below 100 exactly. A candidate that already does is returned
/// unchanged, which makes the function idempotent.
///
/// The candidate must have area (`CropRect::has_area`); degenerate drags are
/// filtered before they get here.
pub fn clamp_to_bounds(candidate: CropRect, displayed: Size) -> CropRect {
    debug_assert!(candidate.has_area(), "degenerate crop reached clamping");
    debug_assert!(displayed.is_measurable(), "clamping against unmeasured box");

    if candidate.is_valid() {
        return settle_edges(candidate);
    }

    let (dw, dh) = (displayed.width, displayed.height);

    let px = candidate.x / 100.0 * dw;
    let py = candidate.y / 100.0 * dh;
    let pw = candidate.width / 100.0 * dw;
    let ph = candidate.height / 100.0 * dh;

    let center_x = px + pw / 2.0;
    let center_y = py + ph / 2.0;

    let width_px = pw.min(dw);
    let height_px = ph.min(dh);

    let x_px = (center_x - width_px / 2.0).min(dw - width_px).max(0.0);
    let y_px = (center_y - height_px / 2.0).min(dh - height_px).max(0.0);

    let clamped = settle_edges(CropRect::new(
        x_px / dw * 100.0,
        y_px / dh * 100.0,
        width_px / dw * 100.0,
        height_px / dh * 100.0,
    ));
    debug_assert!(
        clamped.is_valid() && clamped.right() <= 100.0 && clamped.bottom() <= 100.0,
        "clamp produced {clamped:?}"
    );
    clamped
}

/// Clamp a candidate while holding an aspect ratio.
///
/// When the size-clamped candidate strays from `aspect_ratio`, its dominant
/// axis is shrunk about the candidate's center before the bounds clamp. With
/// no ratio this is exactly [`clamp_to_bounds`].
pub fn clamp_to_bounds_with_aspect(
    candidate: CropRect,
    displayed: Size,
    aspect_ratio: Option<f64>,
) -> CropRect {
    match aspect_ratio.filter(|r| is_valid_ratio(*r)) {
        Some(aspect) => clamp_to_bounds(fit_aspect(candidate, displayed, aspect), displayed),
        None => clamp_to_bounds(candidate, displayed),
    }
}

/// Displayed-pixel width over height of a rectangle.
pub fn pixel_aspect(crop: &CropRect, displayed: Size) -> f64 {
    (crop.width * displayed.width) / (crop.height * displayed.height)
}

fn fit_aspect(candidate: CropRect, displayed: Size, aspect: f64) -> CropRect {
    let (dw, dh) = (displayed.width, displayed.height);
    let pw = (candidate.width / 100.0 * dw).min(dw);
    let ph = (candidate.height / 100.0 * dh).min(dh);

    let current = pw / ph;
    if ((current - aspect) / aspect).abs() <= ASPECT_TOLERANCE {
        return candidate;
    }

    let (pw, ph) = if current > aspect {
        (ph * aspect, ph)
    } else {
        (pw, pw / aspect)
    };

    let center_x = candidate.x + candidate.width / 2.0;
    let center_y = candidate.y + candidate.height / 2.0;
    let width = pw / dw * 100.0;
    let height = ph / dh * 100.0;

    CropRect::new(
        center_x - width / 2.0,
        center_y - height / 2.0,
        width,
        height,
    )
}

/// Pull the far edges back to 100 exactly, moving the origin before the size.
///
/// `is_valid` lets an edge overshoot by `BOUNDS_EPSILON`; stored selections
/// never do.
fn settle_edges(crop: CropRect) -> CropRect {
    let (x, width) = settle_axis(crop.x, crop.width);
    let (y, height) = settle_axis(crop.y, crop.height);
    CropRect::new(x, y, width, height)
}

fn settle_axis(origin: f64, extent: f64) -> (f64, f64) {
    let extent = extent.min(100.0);
    if origin + extent <= 100.0 {
        return (origin, extent);
    }

    let mut origin = (100.0 - extent).max(0.0);
    // 100 - extent can round up by an ulp
    while origin > 0.0 && origin + extent > 100.0 {
        origin = f64::from_bits(origin.to_bits() - 1);
    }
    (origin, extent)
}

#[inline]
fn is_valid_ratio(ratio: f64) -> bool {
    ratio.is_finite() && ratio > 0.0
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for displayed box sizes, fractional pixels included.
    fn displayed_strategy() -> impl Strategy<Value = Size> {
        (1.0f64..=4000.0, 1.0f64..=4000.0).prop_map(|(w, h)| Size::new(w, h))
    }

    /// Candidates with positive extent and arbitrary position.
    fn candidate_strategy() -> impl Strategy<Value = CropRect> {
        (
            -200.0f64..=300.0,
            -200.0f64..=300.0,
            0.001f64..=100.0,
            0.001f64..=100.0,
        )
            .prop_map(|(x, y, w, h)| CropRect::new(x, y, w, h))
    }

    proptest! {
        /// Property: Output always satisfies the containment invariants.
        #[test]
        fn prop_clamp_output_is_valid(
            candidate in candidate_strategy(),
            displayed in displayed_strategy(),
        ) {
            let clamped = clamp_to_bounds(candidate, displayed);
            prop_assert!(clamped.is_valid(), "invalid output {:?}", clamped);
            prop_assert!(clamped.right() <= 100.0 && clamped.bottom() <= 100.0);
        }

        /// Property: Edges inside the tolerance band are settled to 100.
        #[test]
        fn prop_clamp_settles_tolerance_band(
            width in 0.001f64..=100.0,
            height in 0.001f64..=100.0,
            overshoot in 0.0f64..=1e-9,
            displayed in displayed_strategy(),
        ) {
            let candidate = CropRect::new(
                (100.0 - width + overshoot).max(0.0),
                (100.0 - height + overshoot).max(0.0),
                width,
                height,
            );
            let clamped = clamp_to_bounds(candidate, displayed);
            prop_assert!(clamped.right() <= 100.0, "right {}", clamped.right());
            prop_assert!(clamped.bottom() <= 100.0, "bottom {}", clamped.bottom());
            prop_assert_eq!(clamp_to_bounds(clamped, displayed), clamped);
        }

        /// Property: Clamping twice equals clamping once.
        #[test]
        fn prop_clamp_is_idempotent(
            candidate in candidate_strategy(),
            displayed in displayed_strategy(),
        ) {
            let once = clamp_to_bounds(candidate, displayed);
            let twice = clamp_to_bounds(once, displayed);
            prop_assert_eq!(once, twice);
        }

        /// Property: Size is preserved for candidates no larger than the box.
        #[test]
        fn prop_clamp_preserves_size(
            candidate in candidate_strategy(),
            displayed in displayed_strategy(),
        ) {
            let clamped = clamp_to_bounds(candidate, displayed);
            prop_assert!((clamped.width - candidate.width).abs() < 1e-6);
            prop_assert!((clamped.height - candidate.height).abs() < 1e-6);
        }

        /// Property: Aspect-locked clamps are valid, idempotent and keep the ratio.
        #[test]
        fn prop_aspect_clamp_holds_ratio(
            candidate in candidate_strategy(),
            displayed in displayed_strategy(),
            aspect in 0.1f64..=10.0,
        ) {
            let clamped = clamp_to_bounds_with_aspect(candidate, displayed, Some(aspect));
            prop_assert!(clamped.is_valid(), "invalid output {:?}", clamped);
            prop_assert!(clamped.right() <= 100.0 && clamped.bottom() <= 100.0);

            let ratio = pixel_aspect(&clamped, displayed);
            prop_assert!(((ratio - aspect) / aspect).abs() < 1e-5, "ratio {} vs {}", ratio, aspect);

            let again = clamp_to_bounds_with_aspect(clamped, displayed, Some(aspect));
            prop_assert_eq!(clamped, again);
        }

        /// Property: Initialized rectangles are valid and centered.
        #[test]
        fn prop_initialize_centered(
            displayed in displayed_strategy(),
            aspect in proptest::option::of(0.1f64..=10.0),
        ) {
            let metrics = ViewportMetrics::new(displayed, 100, 100);
            let crop = initialize(&metrics, aspect);
            prop_assert!(crop.is_valid(), "invalid output {:?}", crop);
            prop_assert!(crop.right() <= 100.0 && crop.bottom() <= 100.0);
            prop_assert!((crop.x + crop.width / 2.0 - 50.0).abs() < 1e-9);
            prop_assert!((crop.y + crop.height / 2.0 - 50.0).abs() < 1e-9);
        }
    }
}
