use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use diagramlens_core::{LensError, LensResult, Part};
use tracing::{debug, info};
use uuid::Uuid;

use crate::mime_detect::{is_supported_image, resolve_mime};

/// An uploaded image, validated and ready to be sent to a model.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl ImagePayload {
    /// Validate an upload and label it with its real MIME type.
    pub fn from_upload(
        filename: Option<&str>,
        declared_mime: Option<&str>,
        data: Bytes,
        max_bytes: usize,
    ) -> LensResult<Self> {
        if data.is_empty() {
            return Err(LensError::EmptyUpload);
        }
        if data.len() > max_bytes {
            return Err(LensError::PayloadTooLarge {
                size: data.len(),
                limit: max_bytes,
            });
        }

        let mime_type = resolve_mime(declared_mime, filename, &data);
        debug!(mime = %mime_type, declared = ?declared_mime, "Resolved upload MIME type");
        if !is_supported_image(&mime_type) {
            return Err(LensError::UnsupportedMedia(mime_type));
        }

        let payload = Self {
            id: Uuid::new_v4(),
            filename: filename.unwrap_or("upload").to_string(),
            mime_type,
            data,
        };
        info!(
            id = %payload.id,
            mime = %payload.mime_type,
            size_bytes = payload.data.len(),
            "Accepted image upload"
        );
        Ok(payload)
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// The inline image part sent to the model.
    pub fn to_part(&self) -> Part {
        Part::InlineImage {
            mime_type: self.mime_type.clone(),
            data: self.to_base64(),
        }
    }

    /// `data:` URL used to echo a preview back to the browser.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}
