//! Turning uploaded bytes back into pixels.

use image::{ImageFormat, RgbaImage};

use crate::error::DecodeError;
use crate::selection::{ImageKind, SelectedFile};

/// Decode a selected file into an RGBA raster.
///
/// TIFF files always go through the TIFF decoder. Everything else is sniffed from
/// its content first and falls back to the extension, so a PNG misnamed `.jpg`
/// still renders.
pub fn decode_image(file: &SelectedFile) -> Result<RgbaImage, DecodeError> {
    let fail = |reason: String| DecodeError {
        name: file.name.clone(),
        reason,
    };
    if file.bytes.is_empty() {
        return Err(fail("file is empty".to_string()));
    }

    let decoded = match file.kind() {
        ImageKind::Tiff => image::load_from_memory_with_format(&file.bytes, ImageFormat::Tiff),
        ImageKind::Raster => match image::guess_format(&file.bytes) {
            Ok(format) => image::load_from_memory_with_format(&file.bytes, format),
            Err(_) => ImageFormat::from_path(&file.name)
                .and_then(|format| image::load_from_memory_with_format(&file.bytes, format)),
        },
    };

    let image = decoded.map_err(|e| fail(e.to_string()))?;
    tracing::debug!(
        "decoded {} ({}x{})",
        file.name,
        image.width(),
        image.height()
    );
    Ok(image.to_rgba8())
}
