//! MIME type detection for uploaded images.
//!
//! Browsers are unreliable about `Content-Type` on file uploads, so the
//! magic number of the file wins over what the client declared.

use std::path::Path;

/// Image types every configured model accepts inline.
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
    "image/heic",
    "image/heif",
];

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "heic"         => "image/heic",
        "heif"         => "image/heif",
        "bmp"          => "image/bmp",
        "svg"          => "image/svg+xml",
        "tiff" | "tif" => "image/tiff",
        "pdf"          => "application/pdf",
        _              => OCTET_STREAM,
    }
}

/// Detect MIME type from the leading bytes of a file.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return match &bytes[8..12] {
            b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" => Some("image/heic"),
            b"mif1" | b"msf1" => Some("image/heif"),
            _ => None,
        };
    }
    if bytes.starts_with(b"BM") {
        return Some("image/bmp");
    }
    if bytes.starts_with(b"%PDF") {
        return Some("application/pdf");
    }
    None
}

/// Normalize a client-declared content type (`image/JPG; charset=x` → `image/jpeg`).
pub fn normalize_declared(declared: &str) -> String {
    let base = declared
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match base.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => base,
    }
}

/// Pick the MIME type for an upload: magic bytes, then the declared type,
/// then the filename extension.
pub fn resolve_mime(declared: Option<&str>, filename: Option<&str>, bytes: &[u8]) -> String {
    if let Some(sniffed) = sniff_mime_type(bytes) {
        return sniffed.to_string();
    }
    if let Some(declared) = declared.map(normalize_declared) {
        if !declared.is_empty() && declared != OCTET_STREAM {
            return declared;
        }
    }
    filename
        .map(|f| detect_mime_type(Path::new(f)).to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Whether a MIME type is for an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Whether the model accepts this image type.
pub fn is_supported_image(mime: &str) -> bool {
    SUPPORTED_IMAGE_TYPES.contains(&mime)
}
