//! Conversions between JavaScript values and core types.
//!
//! Geometry crosses the boundary as plain objects through serde, the way the
//! rest of the bindings pass structured data. Time crosses as milliseconds
//! from `performance.now()`.

use std::fmt::Display;
use std::time::Duration;

use cropframe_core::CropConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub(crate) fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

/// Read an optional config object; `undefined` and `null` mean defaults.
pub(crate) fn config_from_js(value: JsValue) -> Result<CropConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(CropConfig::default());
    }
    from_js(value, "crop config")
}

/// Host milliseconds to a `Duration`; negative or non-finite input is zero.
pub(crate) fn millis(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_micros((ms * 1000.0).round() as u64)
    } else {
        Duration::ZERO
    }
}

pub(crate) fn to_millis(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis() {
        assert_eq!(millis(250.0), Duration::from_millis(250));
        assert_eq!(millis(0.5), Duration::from_micros(500));
        assert_eq!(millis(0.0), Duration::ZERO);
        assert_eq!(millis(-5.0), Duration::ZERO);
        assert_eq!(millis(f64::NAN), Duration::ZERO);
        assert_eq!(millis(f64::INFINITY), Duration::ZERO);
    }

    #[test]
    fn test_millis_round_trip_whole_values() {
        for ms in [1.0, 16.5, 200.0, 12_345.0] {
            assert_eq!(to_millis(millis(ms)), ms);
        }
    }
}
