//! Safe document/page API over the native PDFium rendering engine.
//!
//! The engine is an opaque shared library bound at runtime (see
//! [`engine::ENGINE_PATH_VAR`] for overriding where it is looked up).
//! Documents pull their bytes lazily from a caller-supplied [`ByteSource`]
//! instead of requiring the whole file in memory; pages rasterize into
//! caller-owned BGRA buffers, optionally composited with interactive
//! form-field overlays, and expose text together with its on-page geometry.
//!
//! ```no_run
//! use pdfium_light::{Document, RenderOptions};
//!
//! # fn main() -> pdfium_light::Result<()> {
//! let doc = Document::open_file("report.pdf", None)?;
//! let page = doc.page(0)?;
//! let bitmap = page.render(&RenderOptions::new(800, 0))?;
//! assert_eq!(bitmap.data().len(), bitmap.stride() * bitmap.height() as usize);
//! # Ok(()) }
//! ```
//!
//! The engine itself is neither reentrant nor thread-safe; every native
//! call in this crate is serialized through one process-wide lock.
//! Documents may be open concurrently, but their engine calls never overlap
//! in time.

mod document;
mod ffi;
mod page;
mod registry;
mod strings;

pub mod engine;
pub mod error;
pub mod geometry;
pub mod metadata;
pub mod outline;
pub mod render;
pub mod stream;

pub use document::Document;
pub use error::{Error, LoadErrorCode, Result};
pub use geometry::{DeviceRect, DeviceWindow, PageRect, Rect};
pub use metadata::Metadata;
pub use outline::OutlineNode;
pub use page::Page;
pub use render::{Bitmap, Clip, RenderFlags, RenderOptions, Rotation};
pub use stream::{BufferedSource, ByteSource, SeekSource};
