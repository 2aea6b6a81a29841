use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Credential or provider client missing.
    #[error("{0}")]
    ConfigError(String),
    /// Malformed or incomplete caller input.
    #[error("{0}")]
    ClientError(String),
    #[error("{0}")]
    MissingInput(String),
    #[error("Invalid image data: {0}")]
    InvalidImageData(String),
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),
    #[error("Upload failed: {0}")]
    UploadFailed(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("{0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl GatewayError {
    /// True when the caller can fix the request; maps to HTTP 400.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GatewayError::ClientError(_)
                | GatewayError::MissingInput(_)
                | GatewayError::InvalidImageData(_)
                | GatewayError::InvalidSeed(_)
        )
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::RequestError(err.to_string())
    }
}

#[cfg(feature = "server")]
impl actix_web::ResponseError for GatewayError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        if self.is_client_error() {
            actix_web::http::StatusCode::BAD_REQUEST
        } else {
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
