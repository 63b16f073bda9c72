//! Image decoding for Cropframe.
//!
//! This module turns the bytes of the user's selected file into an RGBA
//! [`RasterImage`]. The decoded dimensions are the image's natural dimensions.
//!
//! # Examples
//!
//! ```ignore
//! use cropframe_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod source;
mod types;

pub use source::decode_image;
pub use types::{DecodeError, RasterImage};
