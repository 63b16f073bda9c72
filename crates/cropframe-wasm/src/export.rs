//! Exported image handle for JavaScript.

use std::cell::RefCell;

use cropframe_core::export::{ExportedImage, EXPORT_FILE_NAME, EXPORT_MIME_TYPE};
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, Url};

/// A finished crop export.
///
/// # Memory Management
///
/// The PNG bytes live in WASM memory. `object_url()` wraps them in a `Blob`
/// and creates an object URL on first use; the URL stays valid until
/// `release()` is called or the handle is freed, whichever comes first.
#[wasm_bindgen]
pub struct JsExportedImage {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
    url: RefCell<Option<String>>,
}

#[wasm_bindgen]
impl JsExportedImage {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        EXPORT_MIME_TYPE.to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> String {
        EXPORT_FILE_NAME.to_string()
    }

    /// Returns the PNG bytes as a Uint8Array (copied out of WASM memory).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Object URL for the PNG, created on first call.
    pub fn object_url(&self) -> Result<String, JsValue> {
        if let Some(url) = self.url.borrow().as_ref() {
            return Ok(url.clone());
        }

        let array = js_sys::Uint8Array::from(self.bytes.as_slice());
        let parts = js_sys::Array::of1(&array);
        let options = BlobPropertyBag::new();
        options.set_type(EXPORT_MIME_TYPE);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
        let url = Url::create_object_url_with_blob(&blob)?;

        *self.url.borrow_mut() = Some(url.clone());
        Ok(url)
    }

    /// Revoke the object URL, if one was created. Safe to call repeatedly.
    pub fn release(&self) {
        if let Some(url) = self.url.borrow_mut().take() {
            if let Err(err) = Url::revoke_object_url(&url) {
                web_sys::console::warn_2(&"Failed to revoke export URL".into(), &err);
            }
        }
    }

    pub fn has_object_url(&self) -> bool {
        self.url.borrow().is_some()
    }
}

impl JsExportedImage {
    pub(crate) fn from_export(export: ExportedImage) -> Self {
        let (width, height) = export.dimensions();
        Self {
            width,
            height,
            bytes: export.into_bytes(),
            url: RefCell::new(None),
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for JsExportedImage {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropframe_core::decode::{decode_image, RasterImage};
    use cropframe_core::{rasterize, CancelToken, CropRect, InterpolationFilter};

    fn export(width: u32, height: u32) -> JsExportedImage {
        let source = RasterImage::new(width, height, vec![200u8; (width * height * 4) as usize]);
        let export = rasterize(
            &source,
            &CropRect::new(0.0, 0.0, 50.0, 50.0),
            1.0,
            InterpolationFilter::Bilinear,
            &CancelToken::new(),
        )
        .unwrap();
        JsExportedImage::from_export(export)
    }

    #[test]
    fn test_from_export() {
        let image = export(40, 20);
        assert_eq!(image.width(), 20);
        assert_eq!(image.height(), 10);
        assert_eq!(image.byte_length(), image.bytes().len());
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.file_name(), "cropped-image.png");
        assert!(!image.has_object_url());
    }

    #[test]
    fn test_bytes_are_png() {
        let image = export(8, 8);
        let decoded = decode_image(image.as_bytes()).unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.pixel(0, 0), [200, 200, 200, 200]);
    }

    #[test]
    fn test_release_without_url() {
        let image = export(4, 4);
        image.release();
        image.release();
        assert!(!image.has_object_url());
    }
}
