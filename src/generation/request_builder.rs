use crate::{
    config::FalModels,
    error::{GatewayError, Result},
    models::{
        GenerationKind, GenerationOptions, GenerationRequest, ImagePreset, ImageSize,
    },
};
use serde_json::Value;

pub const NO_PROMPT: &str = "No prompt provided";
pub const NO_IMAGES: &str = "No images provided";
pub const NO_IMAGE: &str = "No image provided";

const DEFAULT_ASPECT_RATIO: &str = "auto";
const DEFAULT_RESOLUTION: &str = "1080p";
const DEFAULT_DURATION: &str = "5";

/// Option values after validation and defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub seed: Option<i64>,
    pub num_images: u32,
    pub image_size: Option<ImageSize>,
    pub aspect_ratio: Option<String>,
    pub resolution: Option<String>,
    pub duration: Option<String>,
}

/// Maps endpoint payloads onto the provider's argument schema.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    models: FalModels,
}

impl RequestBuilder {
    pub fn new(models: FalModels) -> Self {
        Self { models }
    }

    pub fn endpoint(&self, kind: GenerationKind) -> &str {
        match kind {
            GenerationKind::Edit => &self.models.edit,
            GenerationKind::TextToImage => &self.models.text_to_image,
            GenerationKind::ImageToVideo => &self.models.image_to_video,
        }
    }

    pub fn build(
        &self,
        kind: GenerationKind,
        prompt: Option<&str>,
        images: Vec<String>,
        options: &GenerationOptions,
    ) -> Result<GenerationRequest> {
        let prompt = require_prompt(prompt)?;
        let image_urls = match kind {
            GenerationKind::TextToImage => Vec::new(),
            GenerationKind::Edit if images.is_empty() => {
                return Err(GatewayError::ClientError(NO_IMAGES.into()))
            }
            GenerationKind::ImageToVideo if images.is_empty() => {
                return Err(GatewayError::ClientError(NO_IMAGE.into()))
            }
            GenerationKind::ImageToVideo => images.into_iter().take(1).collect(),
            GenerationKind::Edit => images,
        };
        let resolved = self.resolve(kind, options)?;

        Ok(GenerationRequest {
            kind,
            prompt,
            image_urls,
            seed: resolved.seed,
            num_images: resolved.num_images,
            image_size: resolved.image_size,
            aspect_ratio: resolved.aspect_ratio,
            resolution: resolved.resolution,
            duration: resolved.duration,
            enable_safety_checker: false,
        })
    }

    /// Validates and defaults the options alone, so callers can reject bad
    /// input before uploading anything.
    pub fn resolve(
        &self,
        kind: GenerationKind,
        options: &GenerationOptions,
    ) -> Result<ResolvedOptions> {
        let seed = coerce_seed(options.seed.as_ref())?;
        let num_images = options.num_images.unwrap_or(1);
        if num_images == 0 {
            return Err(GatewayError::ClientError(
                "num_images must be at least 1".into(),
            ));
        }

        let requested_size = options
            .image_size
            .as_ref()
            .filter(|value| !value.is_null())
            .map(ImageSize::from_value)
            .transpose()?;

        let resolved = match kind {
            GenerationKind::Edit => ResolvedOptions {
                seed,
                num_images,
                image_size: Some(requested_size.unwrap_or(ImageSize::Preset(ImagePreset::Auto4K))),
                aspect_ratio: None,
                resolution: None,
                duration: None,
            },
            GenerationKind::TextToImage => ResolvedOptions {
                seed,
                num_images,
                image_size: Some(
                    requested_size.unwrap_or(ImageSize::Preset(ImagePreset::SquareHd)),
                ),
                aspect_ratio: None,
                resolution: None,
                duration: None,
            },
            GenerationKind::ImageToVideo => ResolvedOptions {
                seed,
                num_images: 1,
                image_size: None,
                aspect_ratio: Some(
                    non_empty(options.aspect_ratio.as_deref())
                        .unwrap_or(DEFAULT_ASPECT_RATIO)
                        .to_string(),
                ),
                resolution: Some(
                    non_empty(options.resolution.as_deref())
                        .unwrap_or(DEFAULT_RESOLUTION)
                        .to_string(),
                ),
                duration: Some(coerce_duration(options.duration.as_ref())?),
            },
        };

        Ok(resolved)
    }
}

pub fn require_prompt(prompt: Option<&str>) -> Result<String> {
    match prompt {
        Some(prompt) if !prompt.trim().is_empty() => Ok(prompt.to_string()),
        _ => Err(GatewayError::ClientError(NO_PROMPT.into())),
    }
}

/// Seeds arrive as numbers or numeric strings; null and "" mean "no seed".
pub fn coerce_seed(value: Option<&Value>) -> Result<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .map(f64::trunc)
                    .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Some)
            .ok_or_else(|| GatewayError::InvalidSeed(number.to_string())),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| GatewayError::InvalidSeed(text.clone())),
        Some(other) => Err(GatewayError::InvalidSeed(other.to_string())),
    }
}

/// Duration is always sent as text, whatever type the caller used.
pub fn coerce_duration(value: Option<&Value>) -> Result<String> {
    match value {
        None | Some(Value::Null) => Ok(DEFAULT_DURATION.to_string()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(DEFAULT_DURATION.to_string()),
        Some(Value::String(text)) => Ok(text.trim().to_string()),
        Some(other) => Err(GatewayError::ClientError(format!(
            "Invalid duration: {}",
            other
        ))),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> RequestBuilder {
        RequestBuilder::new(FalModels::default())
    }

    #[test]
    fn test_edit_defaults() {
        let request = builder()
            .build(
                GenerationKind::Edit,
                Some("make it red"),
                vec!["https://a.test/1.png".into(), "https://a.test/2.png".into()],
                &GenerationOptions::default(),
            )
            .unwrap();

        let args = request.arguments();
        assert_eq!(args["image_size"], "auto_4K");
        assert_eq!(args["num_images"], 1);
        assert_eq!(args["enable_safety_checker"], false);
        assert_eq!(
            args["image_urls"],
            json!(["https://a.test/1.png", "https://a.test/2.png"])
        );
        assert!(args.get("seed").is_none());
    }

    #[test]
    fn test_text_to_image_defaults_and_override() {
        let request = builder()
            .build(
                GenerationKind::TextToImage,
                Some("a cat"),
                vec!["https://ignored.test".into()],
                &GenerationOptions::default(),
            )
            .unwrap();
        assert_eq!(request.arguments()["image_size"], "square_hd");
        assert!(request.arguments().get("image_urls").is_none());

        let options = GenerationOptions {
            image_size: Some(json!("landscape_16_9")),
            num_images: Some(3),
            ..Default::default()
        };
        let request = builder()
            .build(GenerationKind::TextToImage, Some("a cat"), vec![], &options)
            .unwrap();
        assert_eq!(request.arguments()["image_size"], "landscape_16_9");
        assert_eq!(request.arguments()["num_images"], 3);
    }

    #[test]
    fn test_unknown_image_size_is_client_error() {
        let options = GenerationOptions {
            image_size: Some(json!("gigantic")),
            ..Default::default()
        };
        let err = builder()
            .build(GenerationKind::TextToImage, Some("a cat"), vec![], &options)
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_missing_prompt_and_images() {
        let err = builder()
            .build(GenerationKind::Edit, Some("  "), vec![], &GenerationOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), NO_PROMPT);

        let err = builder()
            .build(GenerationKind::Edit, Some("x"), vec![], &GenerationOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), NO_IMAGES);

        let err = builder()
            .build(GenerationKind::ImageToVideo, Some("x"), vec![], &GenerationOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), NO_IMAGE);
    }

    #[test]
    fn test_seed_coercion() {
        assert_eq!(coerce_seed(None).unwrap(), None);
        assert_eq!(coerce_seed(Some(&json!(null))).unwrap(), None);
        assert_eq!(coerce_seed(Some(&json!(""))).unwrap(), None);
        assert_eq!(coerce_seed(Some(&json!(42))).unwrap(), Some(42));
        assert_eq!(coerce_seed(Some(&json!(0))).unwrap(), Some(0));
        assert_eq!(coerce_seed(Some(&json!(7.9))).unwrap(), Some(7));
        assert_eq!(coerce_seed(Some(&json!(" 123 "))).unwrap(), Some(123));
        assert!(matches!(
            coerce_seed(Some(&json!("lucky"))),
            Err(GatewayError::InvalidSeed(_))
        ));
        assert!(coerce_seed(Some(&json!(true))).is_err());
    }

    #[test]
    fn test_out_of_range_seed_is_rejected() {
        assert_eq!(coerce_seed(Some(&json!(-3.5))).unwrap(), Some(-3));
        for seed in [json!(1e300), json!(-1e300), json!(18446744073709551615u64)] {
            assert!(matches!(
                coerce_seed(Some(&seed)),
                Err(GatewayError::InvalidSeed(_))
            ));
        }
    }

    #[test]
    fn test_video_duration_is_stringified() {
        let options = GenerationOptions {
            duration: Some(json!(10)),
            seed: Some(json!("5")),
            ..Default::default()
        };
        let request = builder()
            .build(
                GenerationKind::ImageToVideo,
                Some("pan left"),
                vec!["https://a.test/1.png".into(), "https://a.test/2.png".into()],
                &options,
            )
            .unwrap();

        let args = request.arguments();
        assert_eq!(args["duration"], "10");
        assert_eq!(args["seed"], 5);
        assert_eq!(args["aspect_ratio"], "auto");
        assert_eq!(args["resolution"], "1080p");
        assert_eq!(args["image_url"], "https://a.test/1.png");

        assert_eq!(coerce_duration(Some(&json!("8"))).unwrap(), "8");
        assert_eq!(coerce_duration(None).unwrap(), "5");
    }

    #[test]
    fn test_endpoints_follow_models() {
        let builder = builder();
        assert_eq!(
            builder.endpoint(GenerationKind::Edit),
            "fal-ai/bytedance/seedream/v4.5/edit"
        );
        assert_eq!(
            builder.endpoint(GenerationKind::ImageToVideo),
            "fal-ai/bytedance/seedance/v1/pro/image-to-video"
        );
    }
}
