use crate::{
    error::{GatewayError, Result},
    fal::{MediaProvider, UploadFile},
    models::{extension_for_mime, ImageReference, NormalizedImage, DEFAULT_IMAGE_MIME},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::Path;
use std::sync::Arc;

/// Turns caller image references into URLs the provider can read.
#[derive(Clone)]
pub struct ImageNormalizer {
    provider: Arc<dyn MediaProvider>,
}

impl ImageNormalizer {
    pub fn new(provider: Arc<dyn MediaProvider>) -> Self {
        Self { provider }
    }

    /// Remote URLs pass through untouched; inline data is decoded and uploaded
    /// once.
    pub async fn normalize(
        &self,
        reference: ImageReference,
        fallback_name: &str,
    ) -> Result<NormalizedImage> {
        match reference {
            ImageReference::RemoteUrl(url) => Ok(NormalizedImage {
                url,
                name: fallback_name.to_string(),
            }),
            ImageReference::InlineData { data, name, mime } => {
                let name = name.unwrap_or_else(|| fallback_name.to_string());
                let bytes = decode_image_data(&data)?;
                let url = self.upload_bytes(bytes, &name, mime.as_deref()).await?;
                Ok(NormalizedImage { url, name })
            }
        }
    }

    /// Uploads already-decoded bytes straight from memory.
    pub async fn upload_bytes(
        &self,
        bytes: Vec<u8>,
        name: &str,
        mime: Option<&str>,
    ) -> Result<String> {
        let content_type = mime.unwrap_or(DEFAULT_IMAGE_MIME).to_string();
        let file = UploadFile {
            file_name: upload_file_name(name, &content_type),
            content_type,
            bytes,
        };

        self.provider.upload(file).await.map_err(|e| match e {
            GatewayError::UploadFailed(_) => e,
            other => GatewayError::UploadFailed(other.to_string()),
        })
    }
}

/// Decodes raw base64 or the payload half of a data-URL. Only the text after
/// the first comma is decoded; line breaks and spaces are ignored.
pub fn decode_image_data(data: &str) -> Result<Vec<u8>> {
    let payload = match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(GatewayError::InvalidImageData("empty image data".into()));
    }

    BASE64
        .decode(cleaned.as_bytes())
        .map_err(|e| GatewayError::InvalidImageData(e.to_string()))
}

fn upload_file_name(name: &str, content_type: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "image".to_string());

    if Path::new(&base).extension().is_some() {
        base
    } else {
        format!("{}.{}", base, extension_for_mime(content_type))
    }
}
