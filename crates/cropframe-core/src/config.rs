//! Session configuration.
//!
//! All values have defaults matching the stock cropper behavior, so an empty
//! JSON object (or `CropConfig::default()`) is a complete configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transform::InterpolationFilter;

/// Errors reported by [`CropConfig::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid zoom step: {0} (must be finite and greater than zero)")]
    InvalidZoomStep(f64),

    #[error("Invalid minimum zoom: {0} (must be finite and greater than zero)")]
    InvalidMinZoom(f64),

    #[error("Invalid pan step: {0} (must be finite and greater than zero)")]
    InvalidPanStep(f64),

    #[error("Invalid fixed aspect ratio: {0} (must be finite and greater than zero)")]
    InvalidAspectRatio(f64),
}

/// How the selection's aspect ratio is constrained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectLock {
    /// Width and height move independently.
    Free,
    /// Locked to the natural image's width / height.
    #[default]
    Natural,
    /// Locked to a fixed width / height ratio.
    Fixed(f64),
}

impl AspectLock {
    /// Resolve to a concrete ratio given the natural image's ratio.
    pub fn resolve(self, natural_aspect: Option<f64>) -> Option<f64> {
        match self {
            AspectLock::Free => None,
            AspectLock::Natural => natural_aspect,
            AspectLock::Fixed(ratio) => Some(ratio),
        }
    }
}

/// Tunables for a crop session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Scale added or removed per zoom action
    pub zoom_step: f64,
    /// Smallest reachable zoom scale
    pub min_zoom: f64,
    /// Pixels scrolled per pan action
    pub pan_step: f64,
    /// Trailing-edge debounce window for viewport resizes
    pub resize_debounce_ms: u64,
    /// Selection aspect constraint
    pub aspect: AspectLock,
    /// Sampling filter used during export
    pub filter: InterpolationFilter,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            zoom_step: 0.1,
            min_zoom: 0.1,
            pan_step: 60.0,
            resize_debounce_ms: 200,
            aspect: AspectLock::Natural,
            filter: InterpolationFilter::Bilinear,
        }
    }
}

impl CropConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.zoom_step) {
            return Err(ConfigError::InvalidZoomStep(self.zoom_step));
        }
        if !is_positive(self.min_zoom) {
            return Err(ConfigError::InvalidMinZoom(self.min_zoom));
        }
        if !is_positive(self.pan_step) {
            return Err(ConfigError::InvalidPanStep(self.pan_step));
        }
        if let AspectLock::Fixed(ratio) = self.aspect {
            if !is_positive(ratio) {
                return Err(ConfigError::InvalidAspectRatio(ratio));
            }
        }
        Ok(())
    }
}

#[inline]
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CropConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.zoom_step, 0.1);
        assert_eq!(config.pan_step, 60.0);
        assert_eq!(config.resize_debounce_ms, 200);
        assert_eq!(config.aspect, AspectLock::Natural);
    }

    #[test]
    fn test_invalid_zoom_step() {
        let mut config = CropConfig::default();
        config.zoom_step = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidZoomStep(0.0)));
    }

    #[test]
    fn test_invalid_min_zoom() {
        let mut config = CropConfig::default();
        config.min_zoom = -0.5;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMinZoom(-0.5)));
    }

    #[test]
    fn test_invalid_pan_step() {
        let mut config = CropConfig::default();
        config.pan_step = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPanStep(_))
        ));
    }

    #[test]
    fn test_invalid_fixed_aspect() {
        let mut config = CropConfig::default();
        config.aspect = AspectLock::Fixed(0.0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidAspectRatio(0.0)));
    }

    #[test]
    fn test_aspect_resolve() {
        assert_eq!(AspectLock::Free.resolve(Some(1.5)), None);
        assert_eq!(AspectLock::Natural.resolve(Some(1.5)), Some(1.5));
        assert_eq!(AspectLock::Natural.resolve(None), None);
        assert_eq!(AspectLock::Fixed(2.0).resolve(Some(1.5)), Some(2.0));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CropConfig = serde_json::from_str(r#"{"pan_step": 30.0}"#).unwrap();
        assert_eq!(config.pan_step, 30.0);
        assert_eq!(config.zoom_step, 0.1);
        assert_eq!(config.filter, InterpolationFilter::Bilinear);
    }

    #[test]
    fn test_aspect_json_forms() {
        let config: CropConfig = serde_json::from_str(r#"{"aspect": "free"}"#).unwrap();
        assert_eq!(config.aspect, AspectLock::Free);

        let config: CropConfig = serde_json::from_str(r#"{"aspect": {"fixed": 1.5}}"#).unwrap();
        assert_eq!(config.aspect, AspectLock::Fixed(1.5));
    }
}
