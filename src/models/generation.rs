use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{GatewayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Edit,
    TextToImage,
    ImageToVideo,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Edit => "edit",
            GenerationKind::TextToImage => "text-to-image",
            GenerationKind::ImageToVideo => "image-to-video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagePreset {
    #[serde(rename = "square_hd")]
    SquareHd,
    #[serde(rename = "square")]
    Square,
    #[serde(rename = "portrait_4_3")]
    Portrait4x3,
    #[serde(rename = "portrait_16_9")]
    Portrait16x9,
    #[serde(rename = "landscape_4_3")]
    Landscape4x3,
    #[serde(rename = "landscape_16_9")]
    Landscape16x9,
    #[serde(rename = "auto_2K")]
    Auto2K,
    #[serde(rename = "auto_4K")]
    Auto4K,
}

/// Output size: one of the named presets or explicit pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSize {
    Preset(ImagePreset),
    Custom { width: u32, height: u32 },
}

impl ImageSize {
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|_| {
            GatewayError::ClientError(format!(
                "Invalid image_size: {}. Expected one of square_hd, square, portrait_4_3, \
                 portrait_16_9, landscape_4_3, landscape_16_9, auto_2K, auto_4K or {{\"width\", \"height\"}}",
                value
            ))
        })
    }
}

/// Caller-supplied knobs, still in their loosely typed wire form.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub seed: Option<Value>,
    pub num_images: Option<u32>,
    pub image_size: Option<Value>,
    pub aspect_ratio: Option<String>,
    pub resolution: Option<String>,
    pub duration: Option<Value>,
}

/// Fully validated provider call. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub prompt: String,
    pub image_urls: Vec<String>,
    pub seed: Option<i64>,
    pub num_images: u32,
    pub image_size: Option<ImageSize>,
    pub aspect_ratio: Option<String>,
    pub resolution: Option<String>,
    pub duration: Option<String>,
    pub enable_safety_checker: bool,
}

impl GenerationRequest {
    /// Renders the provider's argument schema for this kind of job.
    pub fn arguments(&self) -> Value {
        let mut args = Map::new();
        args.insert("prompt".to_string(), json!(self.prompt));

        match self.kind {
            GenerationKind::Edit => {
                args.insert("image_urls".to_string(), json!(self.image_urls));
                args.insert("num_images".to_string(), json!(self.num_images));
            }
            GenerationKind::TextToImage => {
                args.insert("num_images".to_string(), json!(self.num_images));
            }
            GenerationKind::ImageToVideo => {
                if let Some(url) = self.image_urls.first() {
                    args.insert("image_url".to_string(), json!(url));
                }
                if let Some(aspect_ratio) = &self.aspect_ratio {
                    args.insert("aspect_ratio".to_string(), json!(aspect_ratio));
                }
                if let Some(resolution) = &self.resolution {
                    args.insert("resolution".to_string(), json!(resolution));
                }
                if let Some(duration) = &self.duration {
                    args.insert("duration".to_string(), json!(duration));
                }
            }
        }

        if let Some(size) = &self.image_size {
            args.insert("image_size".to_string(), json!(size));
        }
        args.insert(
            "enable_safety_checker".to_string(),
            json!(self.enable_safety_checker),
        );
        if let Some(seed) = self.seed {
            args.insert("seed".to_string(), json!(seed));
        }

        Value::Object(args)
    }
}

/// Completed provider job as returned to single-shot callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub request_id: String,
    pub images: Vec<Value>,
    pub video: Option<Value>,
}

impl GenerationResult {
    pub fn from_output(request_id: impl Into<String>, data: &Value) -> Self {
        let request_id = data
            .get("request_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| request_id.into());

        GenerationResult {
            request_id,
            images: data
                .get("images")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            video: data.get("video").cloned(),
        }
    }

    pub fn first_image_url(&self) -> Option<&str> {
        self.images
            .first()
            .and_then(|image| image.get("url"))
            .and_then(Value::as_str)
    }
}
