//! Crop session bindings.
//!
//! `JsCropSession` is what the host's crop dialog holds while it is open. The
//! host forwards DOM events (image load, drags, zoom buttons, resizes) and
//! renders the geometry that comes back; submit and cancel invoke the
//! callbacks registered with `set_on_submit` / `set_on_cancel`.
//!
//! # Example
//!
//! ```typescript
//! const session = new JsCropSession(bytes, { aspect: 'free' });
//! session.set_on_submit((png: Uint8Array, url: string) => preview(url));
//! img.onload = () => render(session.image_loaded(img.width, img.height));
//! onDrag = (rect) => render(session.drag(mountKey, rect));
//! ```

use cropframe_core::{
    CancelToken, CropConfig, CropRect, CropSession, PanDirection, SessionError, Size,
};
use wasm_bindgen::prelude::*;

use crate::export::JsExportedImage;
use crate::types::{config_from_js, from_js, js_error, millis, to_js, to_millis};

#[wasm_bindgen]
pub struct JsCropSession {
    inner: CropSession,
    export_token: CancelToken,
    on_submit: Option<js_sys::Function>,
    on_cancel: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl JsCropSession {
    /// Open a session over the selected file's bytes.
    ///
    /// `config` is an optional partial `CropConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: &[u8], config: JsValue) -> Result<JsCropSession, JsValue> {
        let config = config_from_js(config)?;
        Self::open(bytes, config).map_err(js_error)
    }

    /// Called with `(png: Uint8Array, url: string)` after a successful submit.
    pub fn set_on_submit(&mut self, callback: js_sys::Function) {
        self.on_submit = Some(callback);
    }

    /// Called with no arguments when the session is cancelled.
    pub fn set_on_cancel(&mut self, callback: js_sys::Function) {
        self.on_cancel = Some(callback);
    }

    #[wasm_bindgen(getter)]
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    #[wasm_bindgen(getter)]
    pub fn natural_width(&self) -> u32 {
        self.inner.natural_size().0
    }

    #[wasm_bindgen(getter)]
    pub fn natural_height(&self) -> u32 {
        self.inner.natural_size().1
    }

    /// Key of the current crop view mount. Tag drags with it.
    #[wasm_bindgen(getter)]
    pub fn mount_key(&self) -> f64 {
        self.inner.mount_key() as f64
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.inner.zoom().scale()
    }

    /// Aspect ratio drags are locked to, or `undefined`.
    #[wasm_bindgen(getter)]
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.inner.aspect_ratio()
    }

    /// The image element finished loading at the given displayed size.
    ///
    /// Returns the initial selection `{ x, y, width, height }` in percent.
    pub fn image_loaded(&mut self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        let crop = self
            .inner
            .image_loaded(Size::new(width, height))
            .map_err(js_error)?;
        to_js(&crop)
    }

    /// Apply a drag-produced rectangle and return the clamped selection.
    pub fn drag(&mut self, mount_key: f64, candidate: JsValue) -> Result<JsValue, JsValue> {
        let candidate: CropRect = from_js(candidate, "crop rectangle")?;
        to_js(&self.drag_rect(mount_key, candidate))
    }

    pub fn crop(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.crop())
    }

    /// The dimming polygon: `{ vertices: [{ x, y }], window }` in percent.
    pub fn mask(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.mask())
    }

    /// The dimming polygon as a CSS `clip-path` value.
    pub fn mask_clip_path(&self) -> String {
        self.inner.mask().to_clip_path()
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.inner.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.inner.zoom_out()
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.inner.reset_zoom()
    }

    /// Scroll the zoomed view one step; `direction` is up, down, left or right.
    ///
    /// Returns the scroll offset `{ x, y }` in pixels.
    pub fn pan(&mut self, direction: &str) -> Result<JsValue, JsValue> {
        let direction = PanDirection::try_from(direction).map_err(js_error)?;
        to_js(&self.inner.pan(direction))
    }

    /// Record a viewport resize; `now_ms` comes from `performance.now()`.
    pub fn resize(&mut self, width: f64, height: f64, now_ms: f64) {
        self.inner.resize(Size::new(width, height), millis(now_ms));
    }

    /// Apply a settled resize. Returns the new mount key when the host should
    /// remount its crop view.
    pub fn poll_resize(&mut self, now_ms: f64) -> Option<f64> {
        self.inner
            .poll_resize(millis(now_ms))
            .map(|remount| remount.key as f64)
    }

    /// When to call `poll_resize` next, in `performance.now()` milliseconds.
    pub fn next_resize_deadline(&self) -> Option<f64> {
        self.inner.next_resize_deadline().map(to_millis)
    }

    /// Rasterize the selection, close the session and notify `on_submit`.
    ///
    /// If the export fails the error is logged to the console and the session
    /// stays open. Once the export exists it is always returned, even when
    /// `on_submit` throws; that error goes to the console.
    pub fn submit(&mut self) -> Result<JsExportedImage, JsValue> {
        let export = match self.inner.submit(&self.export_token) {
            Ok(export) => JsExportedImage::from_export(export),
            Err(err) => {
                web_sys::console::error_1(&format!("Crop export failed: {}", err).into());
                return Err(js_error(err));
            }
        };

        self.on_cancel = None;
        if let Some(callback) = self.on_submit.take() {
            if let Err(err) = notify_submit(&callback, &export) {
                web_sys::console::error_2(&"Crop submit callback failed".into(), &err);
            }
        }
        Ok(export)
    }

    /// Abandon the session and notify `on_cancel`.
    pub fn cancel(&mut self) -> Result<(), JsValue> {
        if !self.close() {
            return Ok(());
        }
        if let Some(callback) = self.on_cancel.take() {
            callback.call0(&JsValue::NULL)?;
        }
        Ok(())
    }
}

impl JsCropSession {
    pub(crate) fn open(bytes: &[u8], config: CropConfig) -> Result<Self, SessionError> {
        Ok(Self {
            inner: CropSession::open(bytes, config)?,
            export_token: CancelToken::new(),
            on_submit: None,
            on_cancel: None,
        })
    }

    /// Drags tagged with anything but a whole, non-negative key are dropped.
    pub(crate) fn drag_rect(&mut self, mount_key: f64, candidate: CropRect) -> CropRect {
        if !mount_key.is_finite() || mount_key < 0.0 || mount_key.fract() != 0.0 {
            return self.inner.crop();
        }
        self.inner.drag(mount_key as u64, candidate)
    }

    /// Close without callbacks. Returns false if already closed.
    fn close(&mut self) -> bool {
        if !self.inner.is_open() {
            return false;
        }
        self.export_token.cancel();
        self.inner.cancel();
        self.on_submit = None;
        true
    }
}

fn notify_submit(
    callback: &js_sys::Function,
    export: &JsExportedImage,
) -> Result<JsValue, JsValue> {
    let bytes = js_sys::Uint8Array::from(export.as_bytes());
    let url = export.object_url()?;
    callback.call2(&JsValue::NULL, &bytes, &JsValue::from_str(&url))
}
