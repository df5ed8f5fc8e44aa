//! Upload handling: turns an uploaded file into the inline-image wire
//! format multimodal models expect.

pub mod image;
pub mod mime_detect;

pub use image::ImagePayload;
pub use mime_detect::{
    detect_mime_type, is_image, is_supported_image, resolve_mime, sniff_mime_type,
    SUPPORTED_IMAGE_TYPES,
};

/// Default upload cap; Gemini rejects inline requests above 20 MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
