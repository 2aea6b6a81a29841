//! HTTP gateway in front of fal.ai generative media models.
//!
//! The library half holds the provider client, image normalization, request
//! building and the pose x outfit batch runner; the `server` feature adds the
//! actix-web endpoints on top.

pub mod config;
pub mod error;
pub mod fal;
pub mod generation;
pub mod logger;
pub mod models;

#[cfg(feature = "server")]
pub mod server;

pub use config::{Config, FalConfig, FalModels, LogFormat};
pub use error::{GatewayError, Result};
pub use fal::{FalClient, JobOutput, MediaProvider, UploadFile};
pub use generation::{BatchOrchestrator, GenerationClient, ImageNormalizer, RequestBuilder};
pub use models::*;
