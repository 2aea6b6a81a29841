use super::{decode_json, read_body};
use crate::{
    error::Result,
    models::{BatchPayload, BatchResponse, ImageInput, LabeledImage},
    server::{cors, state::AppState},
};
use actix_web::{http::Method, web, HttpResponse};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/batch")
            .route(web::post().to(batch))
            .route(web::method(Method::OPTIONS).to(cors::preflight)),
    );
}

/// `POST /api/batch`: every pose against every outfit.
///
/// Per-pair failures are reported inside a 200 response; only input and
/// normalization errors fail the request as a whole.
pub async fn batch(state: web::Data<AppState>, payload: web::Payload) -> Result<HttpResponse> {
    let generator = state.generator()?;
    let body = read_body(payload, state.config.max_body_bytes).await?;
    let payload: BatchPayload = decode_json(&body)?;

    let poses = labeled(payload.poses);
    let outfits = labeled(payload.outfits);

    let batch = generator
        .run_batch(
            poses,
            outfits,
            payload.prompt.as_deref(),
            payload.seed.as_ref(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(BatchResponse {
        success: true,
        batch,
    }))
}

fn labeled(inputs: Option<Vec<ImageInput>>) -> Vec<LabeledImage> {
    inputs
        .unwrap_or_default()
        .into_iter()
        .map(ImageInput::into_labeled)
        .collect()
}
