//! Image content encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use gateway_core::{BackendError, ImageAttachment};
use image::ImageFormat;
use std::io::Cursor;

/// MIME type of encoded images
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// Encode an image as base64 PNG
///
/// # Errors
/// Returns [`BackendError::Encoding`] if the bitmap cannot be written as PNG
pub fn png_base64(image: &ImageAttachment) -> Result<String, BackendError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .bitmap()
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| BackendError::encoding(format!("failed to encode image as PNG: {e}")))?;
    Ok(STANDARD.encode(buffer.into_inner()))
}

/// Encode an image as a `data:image/png;base64,...` URL
///
/// # Errors
/// Returns [`BackendError::Encoding`] if the bitmap cannot be written as PNG
pub fn png_data_url(image: &ImageAttachment) -> Result<String, BackendError> {
    Ok(format!("data:{PNG_MEDIA_TYPE};base64,{}", png_base64(image)?))
}
