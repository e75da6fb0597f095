//! Offscreen thumbnail export of Argon visualisation documents.
//!
//! An [`exporter::ArgonSceneExporter`] loads a [`document::ArgonDocument`], renders
//! its scene once into a 512x512 multisampled framebuffer and writes
//! `<output>/<prefix>_thumbnail.jpeg`.

#[macro_use]
extern crate lazy_static;

pub mod core;
pub mod document;
pub mod exporter;
#[cfg(feature = "offscreen")]
pub mod gl;
#[cfg(feature = "offscreen")]
pub mod sceneviewer;

pub use crate::core::error::{ContextError, ExportError, LoadError, RenderError, TargetError};
pub use document::ArgonDocument;
pub use exporter::{ArgonSceneExporter, DocumentStatus, ExportParameters};
