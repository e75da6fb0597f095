//! Thumbnail export of Argon documents.

pub mod image_writer;
mod parameters;
mod thumbnail;

pub use parameters::*;
pub use thumbnail::*;
