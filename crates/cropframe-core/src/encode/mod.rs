//! Image encoding for Cropframe exports.
//!
//! This module provides lossless PNG encoding of RGBA buffers. All operations
//! are synchronous and single-threaded.
//!
//! # Examples
//!
//! ```ignore
//! use cropframe_core::encode::encode_png;
//!
//! let pixels = vec![128u8; 100 * 100 * 4]; // Gray, opaque-ish image
//! let png_bytes = encode_png(&pixels, 100, 100).unwrap();
//! println!("Encoded {} bytes", png_bytes.len());
//! ```

mod png;

pub use png::{encode_png, EncodeError};
pub(crate) use png::non_empty;
