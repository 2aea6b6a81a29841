//! Single-shot generation endpoints: edit, text-to-image, video and upload.

use super::{content_type, decode_json, parse_json, read_body};
use crate::{
    error::{GatewayError, Result},
    fal::UploadFile,
    models::{
        mime_for_filename, EditPayload, GenerationOptions, ImageReference, ImagesResponse,
        TextToImagePayload, UploadPayload, UploadResponse, VideoPayload, VideoResponse,
    },
    server::{cors, state::AppState},
};
use actix_multipart::{Field, Multipart};
use actix_web::{http::Method, web, HttpRequest, HttpResponse};
use futures::StreamExt;
use serde_json::Value;

const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];
const FILE_FIELDS: [&str; 4] = ["image", "images", "image[]", "images[]"];

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/edit")
            .route(web::post().to(edit))
            .route(web::method(Method::OPTIONS).to(cors::preflight)),
    )
    .service(
        web::resource("/api/generate")
            .route(web::post().to(generate))
            .route(web::method(Method::OPTIONS).to(cors::preflight)),
    )
    .service(
        web::resource("/api/upload")
            .route(web::post().to(upload))
            .route(web::method(Method::OPTIONS).to(cors::preflight)),
    )
    .service(
        web::resource("/api/video")
            .route(web::post().to(video))
            .route(web::method(Method::OPTIONS).to(cors::preflight)),
    );
}

/// `POST /api/edit`, JSON or multipart.
pub async fn edit(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let generator = state.generator()?;
    let limit = state.config.max_body_bytes;

    let result = if content_type(&req).contains("multipart/form-data") {
        let form = read_edit_form(Multipart::new(req.headers(), payload), limit).await?;
        let options = form.options()?;
        generator
            .edit_files(form.prompt.as_deref(), form.files, &options)
            .await?
    } else {
        let body = read_body(payload, limit).await?;
        let payload: EditPayload = parse_json(&req, &body)?;
        let options = payload.options();
        let images = match (payload.image_urls, payload.images) {
            (Some(urls), _) if !urls.is_empty() => urls,
            (_, Some(images)) => images,
            _ => Vec::new(),
        };
        let images = images
            .into_iter()
            .map(|raw| ImageReference::parse(raw, None))
            .collect();

        generator
            .edit(payload.prompt.as_deref(), images, &options)
            .await?
    };

    Ok(HttpResponse::Ok().json(ImagesResponse::from(result)))
}

/// `POST /api/generate`
pub async fn generate(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let generator = state.generator()?;
    let body = read_body(payload, state.config.max_body_bytes).await?;
    let payload: TextToImagePayload = parse_json(&req, &body)?;

    let result = generator
        .text_to_image(payload.prompt.as_deref(), &payload.options())
        .await?;
    Ok(HttpResponse::Ok().json(ImagesResponse::from(result)))
}

/// `POST /api/video`
///
/// A caller-supplied `image_url` wins over inline `image` data, which is
/// only uploaded when no URL was given.
pub async fn video(state: web::Data<AppState>, payload: web::Payload) -> Result<HttpResponse> {
    let generator = state.generator()?;
    let body = read_body(payload, state.config.max_body_bytes).await?;
    let payload: VideoPayload = decode_json(&body)?;
    let options = payload.options();

    let image = payload
        .image_url
        .filter(|value| !value.trim().is_empty())
        .or(payload.image.filter(|value| !value.trim().is_empty()))
        .map(|raw| ImageReference::parse(raw, None));

    let result = generator
        .image_to_video(payload.prompt.as_deref(), image, &options)
        .await?;
    Ok(HttpResponse::Ok().json(VideoResponse::from(result)))
}

/// `POST /api/upload`
pub async fn upload(state: web::Data<AppState>, payload: web::Payload) -> Result<HttpResponse> {
    let generator = state.generator()?;
    let body = read_body(payload, state.config.max_body_bytes).await?;
    let payload: UploadPayload = decode_json(&body)?;

    let url = generator.upload(payload.image.as_deref()).await?;
    Ok(HttpResponse::Ok().json(UploadResponse { success: true, url }))
}

#[derive(Debug, Default)]
struct EditForm {
    prompt: Option<String>,
    seed: Option<String>,
    num_images: Option<String>,
    image_size: Option<String>,
    files: Vec<UploadFile>,
}

impl EditForm {
    fn options(&self) -> Result<GenerationOptions> {
        let num_images = match self.num_images.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(value.parse::<u32>().map_err(|_| {
                GatewayError::ClientError(format!("Invalid num_images: {}", value))
            })?),
        };

        Ok(GenerationOptions {
            seed: self.seed.clone().map(Value::String),
            num_images,
            image_size: self
                .image_size
                .clone()
                .filter(|size| !size.trim().is_empty())
                .map(Value::String),
            ..Default::default()
        })
    }
}

async fn read_edit_form(mut payload: Multipart, limit: usize) -> Result<EditForm> {
    let mut form = EditForm::default();
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| GatewayError::ClientError(format!("Invalid multipart data: {}", e)))?;

        let field_name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if FILE_FIELDS.contains(&field_name.as_str()) {
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string)
                .unwrap_or_default();
            // Browsers send an empty part for an untouched file input.
            if filename.is_empty() {
                read_field(&mut field, limit, &mut total).await?;
                continue;
            }
            if !allowed_file(&filename) {
                return Err(GatewayError::ClientError(format!(
                    "Unsupported file type: {}",
                    filename
                )));
            }

            let bytes = read_field(&mut field, limit, &mut total).await?;
            if bytes.is_empty() {
                continue;
            }
            form.files.push(UploadFile {
                content_type: mime_for_filename(&filename).to_string(),
                file_name: filename,
                bytes,
            });
            continue;
        }

        let bytes = read_field(&mut field, limit, &mut total).await?;
        let text = String::from_utf8_lossy(&bytes).to_string();
        match field_name.as_str() {
            "prompt" => form.prompt = Some(text),
            "seed" => form.seed = Some(text),
            "num_images" => form.num_images = Some(text),
            "image_size" => form.image_size = Some(text),
            _ => {}
        }
    }

    Ok(form)
}

async fn read_field(field: &mut Field, limit: usize, total: &mut usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk
            .map_err(|e| GatewayError::ClientError(format!("Invalid multipart data: {}", e)))?;
        *total += bytes.len();
        if *total > limit {
            return Err(GatewayError::ClientError("Request body too large".into()));
        }
        data.extend_from_slice(&bytes);
    }
    Ok(data)
}

fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
