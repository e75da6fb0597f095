use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use image::{codecs::jpeg::JpegEncoder, ColorType, RgbImage};
use tempfile::NamedTempFile;

use crate::core::error::ExportError;
#[cfg(feature = "offscreen")]
use crate::gl::BoundFramebuffer;

pub const JPEG_QUALITY: u8 = 90;

/// `<directory>/<prefix>_thumbnail.jpeg`
pub fn thumbnail_path<P: AsRef<Path>>(directory: P, prefix: &str) -> PathBuf {
    directory.as_ref().join(format!("{}_thumbnail.jpeg", prefix))
}

pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// Encodes in memory, writes a temporary file next to `path` and renames it into
/// place. On failure `path` is left as it was.
pub fn save_jpeg(image: &RgbImage, path: &Path) -> Result<(), ExportError> {
    let bytes = encode_jpeg(image)?;
    let io_error = |source: io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(&bytes).map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;

    log::info!(
        "wrote {}x{} thumbnail to '{}' ({} bytes)",
        image.width(),
        image.height(),
        path.display(),
        bytes.len()
    );
    Ok(())
}

/// Reads back the bound framebuffer, resolving samples, and saves it as JPEG.
#[cfg(feature = "offscreen")]
pub fn extract_and_save(
    target: &BoundFramebuffer<'_, '_>,
    path: &Path,
) -> Result<(), ExportError> {
    let image = target.to_image();
    save_jpeg(&image, path)
}
