pub type WorkshopResult<T> = Result<T, WorkshopError>;

#[derive(thiserror::Error, Debug)]
pub enum WorkshopError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("http error: {0}")]
    Http(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl WorkshopError {
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<ureq::Error> for WorkshopError {
    fn from(err: ureq::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<base64::DecodeError> for WorkshopError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}
