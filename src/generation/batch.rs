use crate::{
    error::{GatewayError, Result},
    fal::MediaProvider,
    generation::{
        normalizer::ImageNormalizer,
        request_builder::{coerce_seed, RequestBuilder},
    },
    models::{
        BatchResult, GenerationKind, GenerationOptions, GenerationResult, LabeledImage,
        NormalizedImage, PairResult,
    },
};
use futures::future::join_all;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const DEFAULT_BATCH_PROMPT: &str = "Apply the outfit/clothing from Figure 2 onto the person in Figure 1. Keep the exact pose, face, and background from Figure 1. Only change the clothing to match Figure 2.";
pub const MISSING_POSES_OR_OUTFITS: &str = "Need both poses and outfits";

/// Runs every pose x outfit combination as its own edit job.
#[derive(Clone)]
pub struct BatchOrchestrator {
    provider: Arc<dyn MediaProvider>,
    normalizer: ImageNormalizer,
    builder: RequestBuilder,
    concurrency: usize,
}

impl BatchOrchestrator {
    pub fn new(
        provider: Arc<dyn MediaProvider>,
        normalizer: ImageNormalizer,
        builder: RequestBuilder,
        concurrency: usize,
    ) -> Self {
        Self {
            provider,
            normalizer,
            builder,
            concurrency: concurrency.max(1),
        }
    }

    /// Results come back in row-major order (poses outer, outfits inner) no
    /// matter how many pairs run at once. A failing pair is recorded and the
    /// rest continue; a failing normalization aborts the whole batch.
    pub async fn run_batch(
        &self,
        poses: Vec<LabeledImage>,
        outfits: Vec<LabeledImage>,
        prompt: Option<&str>,
        seed: Option<&Value>,
    ) -> Result<BatchResult> {
        if poses.is_empty() || outfits.is_empty() {
            return Err(GatewayError::MissingInput(MISSING_POSES_OR_OUTFITS.into()));
        }

        let prompt = prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_BATCH_PROMPT);
        let options = GenerationOptions {
            seed: coerce_seed(seed)?.map(Value::from),
            num_images: Some(1),
            ..Default::default()
        };

        let pose_images = self.normalize_all(poses, "pose").await?;
        let outfit_images = self.normalize_all(outfits, "outfit").await?;

        log::info!(
            "🧩 Running batch of {} poses x {} outfits ({} at a time)",
            pose_images.len(),
            outfit_images.len(),
            self.concurrency
        );

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let semaphore = Semaphore::new(self.concurrency);

        let pairs = pose_images.iter().enumerate().flat_map(|(pose_index, pose)| {
            outfit_images
                .iter()
                .enumerate()
                .map(move |(outfit_index, outfit)| (pose_index, pose, outfit_index, outfit))
        });

        let tasks = pairs.map(|(pose_index, pose, outfit_index, outfit)| {
            let semaphore = &semaphore;
            let options = &options;
            let timestamp = timestamp.as_str();
            async move {
                let pose_name = file_stem(&pose.name);
                let outfit_name = file_stem(&outfit.name);
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return PairResult::failed(
                            pose_index,
                            outfit_index,
                            pose_name,
                            outfit_name,
                            e.to_string(),
                        )
                    }
                };

                match self.run_pair(prompt, pose, outfit, options).await {
                    Ok(result) => match result.first_image_url() {
                        Some(url) => {
                            let filename = format!(
                                "seedream_{}_p{}_{}_o{}_{}.png",
                                timestamp,
                                pose_index + 1,
                                pose_name,
                                outfit_index + 1,
                                outfit_name
                            );
                            PairResult::completed(
                                pose_index,
                                outfit_index,
                                pose_name,
                                outfit_name,
                                url.to_string(),
                                filename,
                            )
                        }
                        None => PairResult::failed(
                            pose_index,
                            outfit_index,
                            pose_name,
                            outfit_name,
                            "No image returned",
                        ),
                    },
                    Err(e) => {
                        log::warn!(
                            "Pair p{} x o{} failed: {}",
                            pose_index + 1,
                            outfit_index + 1,
                            e
                        );
                        PairResult::failed(
                            pose_index,
                            outfit_index,
                            pose_name,
                            outfit_name,
                            e.to_string(),
                        )
                    }
                }
            }
        });

        let results = join_all(tasks).await;
        let batch = BatchResult::new(results);
        log::info!(
            "✅ Batch finished: {}/{} completed",
            batch.completed,
            batch.total
        );
        Ok(batch)
    }

    async fn run_pair(
        &self,
        prompt: &str,
        pose: &NormalizedImage,
        outfit: &NormalizedImage,
        options: &GenerationOptions,
    ) -> Result<GenerationResult> {
        // Pose first: the prompt refers to it as Figure 1.
        let request = self.builder.build(
            GenerationKind::Edit,
            Some(prompt),
            vec![pose.url.clone(), outfit.url.clone()],
            options,
        )?;
        let endpoint = self.builder.endpoint(GenerationKind::Edit);
        let output = self
            .provider
            .subscribe(endpoint, request.arguments())
            .await?;
        Ok(GenerationResult::from_output(output.request_id, &output.data))
    }

    async fn normalize_all(
        &self,
        images: Vec<LabeledImage>,
        prefix: &str,
    ) -> Result<Vec<NormalizedImage>> {
        let mut normalized = Vec::with_capacity(images.len());
        for (index, image) in images.into_iter().enumerate() {
            let fallback = image
                .label
                .unwrap_or_else(|| format!("{}_{}", prefix, index + 1));
            normalized.push(self.normalizer.normalize(image.reference, &fallback).await?);
        }
        Ok(normalized)
    }
}

/// `dir/look.final.png` -> `look.final`
fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| name.to_string())
}
