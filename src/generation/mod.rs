pub mod batch;
pub mod normalizer;
pub mod request_builder;

use crate::{
    config::FalModels,
    error::{GatewayError, Result},
    fal::{MediaProvider, UploadFile},
    models::{
        BatchResult, GenerationKind, GenerationOptions, GenerationResult, ImageReference,
        LabeledImage,
    },
};
use serde_json::Value;
use std::sync::Arc;

pub use batch::{BatchOrchestrator, DEFAULT_BATCH_PROMPT};
pub use normalizer::{decode_image_data, ImageNormalizer};
pub use request_builder::{RequestBuilder, NO_IMAGE, NO_IMAGES, NO_PROMPT};

/// Everything the HTTP layer needs to run a generation job.
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn MediaProvider>,
    normalizer: ImageNormalizer,
    builder: RequestBuilder,
    batch: BatchOrchestrator,
}

impl GenerationClient {
    pub fn new(
        provider: Arc<dyn MediaProvider>,
        models: FalModels,
        batch_concurrency: usize,
    ) -> Self {
        let normalizer = ImageNormalizer::new(provider.clone());
        let builder = RequestBuilder::new(models);
        let batch = BatchOrchestrator::new(
            provider.clone(),
            normalizer.clone(),
            builder.clone(),
            batch_concurrency,
        );

        Self {
            provider,
            normalizer,
            builder,
            batch,
        }
    }

    /// Edits one or more images with a prompt. Nothing is uploaded until the
    /// prompt and options have been validated.
    pub async fn edit(
        &self,
        prompt: Option<&str>,
        images: Vec<ImageReference>,
        options: &GenerationOptions,
    ) -> Result<GenerationResult> {
        request_builder::require_prompt(prompt)?;
        self.builder.resolve(GenerationKind::Edit, options)?;
        if images.is_empty() {
            return Err(GatewayError::ClientError(NO_IMAGES.into()));
        }

        let mut urls = Vec::with_capacity(images.len());
        for (index, image) in images.into_iter().enumerate() {
            let normalized = self
                .normalizer
                .normalize(image, &format!("image_{}", index + 1))
                .await?;
            urls.push(normalized.url);
        }

        log::info!("🖌️  Editing {} image(s)", urls.len());
        self.run(GenerationKind::Edit, prompt, urls, options).await
    }

    /// Same as [`edit`](Self::edit) for files that arrived as raw bytes.
    pub async fn edit_files(
        &self,
        prompt: Option<&str>,
        files: Vec<UploadFile>,
        options: &GenerationOptions,
    ) -> Result<GenerationResult> {
        request_builder::require_prompt(prompt)?;
        self.builder.resolve(GenerationKind::Edit, options)?;
        if files.is_empty() {
            return Err(GatewayError::ClientError(NO_IMAGES.into()));
        }

        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            let url = self
                .normalizer
                .upload_bytes(file.bytes, &file.file_name, Some(&file.content_type))
                .await?;
            urls.push(url);
        }

        log::info!("🖌️  Editing {} uploaded file(s)", urls.len());
        self.run(GenerationKind::Edit, prompt, urls, options).await
    }

    pub async fn text_to_image(
        &self,
        prompt: Option<&str>,
        options: &GenerationOptions,
    ) -> Result<GenerationResult> {
        log::info!("🎨 Generating image from text");
        self.run(GenerationKind::TextToImage, prompt, Vec::new(), options)
            .await
    }

    pub async fn image_to_video(
        &self,
        prompt: Option<&str>,
        image: Option<ImageReference>,
        options: &GenerationOptions,
    ) -> Result<GenerationResult> {
        request_builder::require_prompt(prompt)?;
        self.builder.resolve(GenerationKind::ImageToVideo, options)?;
        let image = image.ok_or_else(|| GatewayError::ClientError(NO_IMAGE.into()))?;

        let normalized = self.normalizer.normalize(image, "image_1").await?;
        log::info!("🎬 Animating {}", normalized.name);
        self.run(
            GenerationKind::ImageToVideo,
            prompt,
            vec![normalized.url],
            options,
        )
        .await
    }

    /// Stores one inline image and returns its hosted URL.
    pub async fn upload(&self, image: Option<&str>) -> Result<String> {
        let raw = image
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| GatewayError::ClientError(NO_IMAGE.into()))?;

        let normalized = self
            .normalizer
            .normalize(ImageReference::parse(raw, None), "upload")
            .await?;
        Ok(normalized.url)
    }

    pub async fn run_batch(
        &self,
        poses: Vec<LabeledImage>,
        outfits: Vec<LabeledImage>,
        prompt: Option<&str>,
        seed: Option<&Value>,
    ) -> Result<BatchResult> {
        self.batch.run_batch(poses, outfits, prompt, seed).await
    }

    async fn run(
        &self,
        kind: GenerationKind,
        prompt: Option<&str>,
        images: Vec<String>,
        options: &GenerationOptions,
    ) -> Result<GenerationResult> {
        let request = self.builder.build(kind, prompt, images, options)?;
        let endpoint = self.builder.endpoint(kind);
        log::debug!("Submitting {} job to {}", kind.as_str(), endpoint);

        let output = self
            .provider
            .subscribe(endpoint, request.arguments())
            .await?;
        Ok(GenerationResult::from_output(output.request_id, &output.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fal::mock::MockProvider;
    use serde_json::json;

    fn client() -> (Arc<MockProvider>, GenerationClient) {
        let provider = Arc::new(MockProvider::new());
        let client = GenerationClient::new(provider.clone(), FalModels::default(), 1);
        (provider, client)
    }

    #[tokio::test]
    async fn test_edit_uploads_inline_and_forwards_urls() {
        let (provider, client) = client();
        let result = client
            .edit(
                Some("add a hat"),
                vec![
                    ImageReference::parse("https://in.test/a.png", None),
                    ImageReference::parse("data:image/png;base64,aGVsbG8=", None),
                ],
                &GenerationOptions {
                    seed: Some(json!(0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.request_id, "req-0");
        assert_eq!(result.images.len(), 1);
        assert_eq!(provider.upload_count(), 1);

        let calls = provider.calls();
        assert_eq!(calls[0].0, FalModels::default().edit);
        assert_eq!(calls[0].1["image_urls"][0], "https://in.test/a.png");
        assert_eq!(
            calls[0].1["image_urls"][1],
            "https://storage.test/0/image_2.png"
        );
        assert_eq!(calls[0].1["seed"], 0);
    }

    #[tokio::test]
    async fn test_missing_prompt_makes_no_calls() {
        let (provider, client) = client();
        let err = client
            .edit(
                None,
                vec![ImageReference::parse("aGVsbG8=", None)],
                &GenerationOptions::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), NO_PROMPT);
        assert_eq!(provider.upload_count(), 0);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_seed_rejected_before_upload() {
        let (provider, client) = client();
        let err = client
            .edit(
                Some("x"),
                vec![ImageReference::parse("aGVsbG8=", None)],
                &GenerationOptions {
                    seed: Some(json!("abc")),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(provider.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_without_images() {
        let (provider, client) = client();
        let err = client
            .edit(Some("x"), Vec::new(), &GenerationOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), NO_IMAGES);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_files_uploads_raw_bytes() {
        let (provider, client) = client();
        let files = vec![UploadFile {
            bytes: b"raw".to_vec(),
            file_name: "pose.jpg".into(),
            content_type: "image/jpeg".into(),
        }];
        client
            .edit_files(Some("x"), files, &GenerationOptions::default())
            .await
            .unwrap();

        let uploads = provider.uploads.lock().unwrap();
        assert_eq!(uploads[0].bytes, b"raw".to_vec());
        assert_eq!(uploads[0].file_name, "pose.jpg");
        assert_eq!(uploads[0].content_type, "image/jpeg");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_text_to_image() {
        let (provider, client) = client();
        let result = client
            .text_to_image(Some("a lighthouse"), &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(result.first_image_url(), Some("https://out.test/0.png"));
        let calls = provider.calls();
        assert_eq!(calls[0].0, FalModels::default().text_to_image);
        assert_eq!(calls[0].1["image_size"], "square_hd");
    }

    #[tokio::test]
    async fn test_video_requires_image() {
        let (provider, client) = client();
        let err = client
            .image_to_video(Some("zoom in"), None, &GenerationOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), NO_IMAGE);
        assert_eq!(provider.call_count(), 0);

        let result = client
            .image_to_video(
                Some("zoom in"),
                Some(ImageReference::parse("https://in.test/still.png", None)),
                &GenerationOptions::default(),
            )
            .await
            .unwrap();
        assert!(result.video.is_some());
        assert_eq!(provider.calls()[0].1["image_url"], "https://in.test/still.png");
    }

    #[tokio::test]
    async fn test_upload() {
        let (provider, client) = client();
        let url = client.upload(Some("aGVsbG8=")).await.unwrap();
        assert_eq!(url, "https://storage.test/0/upload.png");

        let url = client.upload(Some("https://in.test/a.png")).await.unwrap();
        assert_eq!(url, "https://in.test/a.png");
        assert_eq!(provider.upload_count(), 1);

        let err = client.upload(Some("")).await.unwrap_err();
        assert_eq!(err.to_string(), NO_IMAGE);
    }
}
