use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// An image as supplied by a caller: either already hosted somewhere or carried
/// inline as base64 / data-URL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    RemoteUrl(String),
    InlineData {
        data: String,
        name: Option<String>,
        mime: Option<String>,
    },
}

impl ImageReference {
    /// Classifies raw caller text. Anything starting with `http` is a remote URL,
    /// everything else is treated as inline base64 (optionally data-URL prefixed).
    pub fn parse(raw: impl Into<String>, name: Option<String>) -> Self {
        let raw = raw.into();
        if is_remote_url(&raw) {
            return ImageReference::RemoteUrl(raw);
        }
        let mime = data_url_mime(&raw);
        ImageReference::InlineData {
            data: raw,
            name,
            mime,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ImageReference::RemoteUrl(_) => None,
            ImageReference::InlineData { name, .. } => name.as_deref(),
        }
    }
}

/// Result of normalization: a URL the provider can fetch plus a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedImage {
    pub url: String,
    pub name: String,
}

/// Wire form of a batch pose/outfit entry: a bare string or `{name, data}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageInput {
    Text(String),
    Named {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        data: String,
    },
}

impl ImageInput {
    /// A named remote entry keeps its label so batch filenames stay meaningful.
    pub fn into_labeled(self) -> LabeledImage {
        match self {
            ImageInput::Text(raw) => LabeledImage::from(ImageReference::parse(raw, None)),
            ImageInput::Named { name, data } => {
                let label = name.filter(|value| !value.trim().is_empty());
                LabeledImage {
                    reference: ImageReference::parse(data, label.clone()),
                    label,
                }
            }
        }
    }
}

/// Reference plus the caller's name for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImage {
    pub reference: ImageReference,
    pub label: Option<String>,
}

impl From<ImageReference> for LabeledImage {
    fn from(reference: ImageReference) -> Self {
        let label = reference.name().map(str::to_string);
        Self { reference, label }
    }
}

pub fn is_remote_url(value: &str) -> bool {
    value.starts_with("http")
}

/// `data:image/jpeg;base64,...` -> `image/jpeg`
pub fn data_url_mime(value: &str) -> Option<String> {
    let (header, _) = value.split_once(',')?;
    let header = header.strip_prefix("data:")?;
    let mime = header.split(';').next()?.trim();
    if mime.is_empty() {
        None
    } else {
        Some(mime.to_string())
    }
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

pub fn mime_for_filename(filename: &str) -> &'static str {
    match filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => DEFAULT_IMAGE_MIME,
    }
}
