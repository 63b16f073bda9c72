//! Cropframe WASM - WebAssembly bindings for Cropframe
//!
//! This crate exposes the cropframe-core crop session to JavaScript/TypeScript
//! hosts. The host owns the DOM (image element, drag handles, zoom buttons)
//! and forwards measurements and events; the bindings return the geometry to
//! render and the final PNG export.
//!
//! # Module Structure
//!
//! - `session` - The crop session a dialog holds while open
//! - `export` - Exported PNG handle with object URL management
//! - `types` - Conversions between JS values and core types
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropSession } from '@cropframe/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const session = new JsCropSession(bytes, undefined);
//! const crop = session.image_loaded(img.width, img.height);
//! const png = session.submit();
//! ```

use wasm_bindgen::prelude::*;

mod export;
mod session;
mod types;

pub use export::JsExportedImage;
pub use session::JsCropSession;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
