//! Error Types
//!
//! Every violation is fail-fast. `Type` covers values of the wrong shape,
//! `Reference` covers style misuse and missing required data.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PassError>;

#[derive(Debug, Error)]
pub enum PassError {
    #[error("{0}")]
    Type(String),

    #[error("{0}")]
    Reference(String),

    #[error("Missing required image {0}")]
    MissingImage(String),

    #[error("Image for \"{image_type}\" rejected: {reason}")]
    InvalidImage { image_type: String, reason: String },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl PassError {
    pub(crate) fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    pub(crate) fn reference(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    pub(crate) fn image(image_type: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            image_type: image_type.to_string(),
            reason: reason.into(),
        }
    }
}
