//! Request and response bodies of the HTTP endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BatchResult, GenerationOptions, GenerationResult, ImageInput};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EditPayload {
    pub prompt: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub seed: Option<Value>,
    pub num_images: Option<u32>,
    pub image_size: Option<Value>,
}

impl EditPayload {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            seed: self.seed.clone(),
            num_images: self.num_images,
            image_size: self.image_size.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextToImagePayload {
    pub prompt: Option<String>,
    pub image_size: Option<Value>,
    pub num_images: Option<u32>,
    pub seed: Option<Value>,
}

impl TextToImagePayload {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            seed: self.seed.clone(),
            num_images: self.num_images,
            image_size: self.image_size.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BatchPayload {
    pub poses: Option<Vec<ImageInput>>,
    pub outfits: Option<Vec<ImageInput>>,
    pub prompt: Option<String>,
    pub seed: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadPayload {
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoPayload {
    pub prompt: Option<String>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub aspect_ratio: Option<String>,
    pub resolution: Option<String>,
    pub duration: Option<Value>,
    pub seed: Option<Value>,
}

impl VideoPayload {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            seed: self.seed.clone(),
            aspect_ratio: self.aspect_ratio.clone(),
            resolution: self.resolution.clone(),
            duration: self.duration.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagesResponse {
    pub success: bool,
    pub images: Vec<Value>,
    pub request_id: String,
}

impl From<GenerationResult> for ImagesResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            success: true,
            images: result.images,
            request_id: result.request_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoResponse {
    pub success: bool,
    pub video: Value,
    pub request_id: String,
}

impl From<GenerationResult> for VideoResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            success: true,
            video: result
                .video
                .unwrap_or_else(|| Value::Object(Default::default())),
            request_id: result.request_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(flatten)]
    pub batch: BatchResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}
