//! Export artifacts and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::decode::RasterImage;

/// MIME type of every export.
pub const EXPORT_MIME_TYPE: &str = "image/png";

/// Suggested file name for an export.
pub const EXPORT_FILE_NAME: &str = "cropped-image.png";

/// Cooperative cancellation flag for an in-flight export.
///
/// Clones share the same flag, so a host can keep one clone and hand the
/// other to the export.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// The result of a successful submit: the cropped bitmap and its PNG bytes.
///
/// The caller owns it outright; nothing in the crate keeps a reference, and
/// dropping it releases both buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    bitmap: RasterImage,
    encoded: Vec<u8>,
}

impl ExportedImage {
    pub(crate) fn new(bitmap: RasterImage, encoded: Vec<u8>) -> Self {
        debug_assert!(!encoded.is_empty(), "export without encoded data");
        Self { bitmap, encoded }
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.bitmap.dimensions()
    }

    pub fn bitmap(&self) -> &RasterImage {
        &self.bitmap
    }

    /// PNG-encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.encoded
    }

    pub fn mime_type(&self) -> &'static str {
        EXPORT_MIME_TYPE
    }

    /// Take the PNG bytes, dropping the bitmap.
    pub fn into_bytes(self) -> Vec<u8> {
        self.encoded
    }

    pub fn into_parts(self) -> (RasterImage, Vec<u8>) {
        (self.bitmap, self.encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared_between_clones() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());

        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_token_across_threads() {
        let token = CancelToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_exported_image_accessors() {
        let bitmap = RasterImage::transparent(3, 2);
        let export = ExportedImage::new(bitmap.clone(), vec![1, 2, 3]);

        assert_eq!(export.dimensions(), (3, 2));
        assert_eq!(export.width(), 3);
        assert_eq!(export.height(), 2);
        assert_eq!(export.bytes(), &[1, 2, 3]);
        assert_eq!(export.mime_type(), "image/png");

        let (parts_bitmap, parts_bytes) = export.clone().into_parts();
        assert_eq!(parts_bitmap, bitmap);
        assert_eq!(parts_bytes, vec![1, 2, 3]);
        assert_eq!(export.into_bytes(), vec![1, 2, 3]);
    }
}
